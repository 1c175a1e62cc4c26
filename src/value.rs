use crate::buffers::TypeCode;

/// A single calendar date, as stored in the native CLI's `DATE_STRUCT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Date {
    pub year: i16,
    pub month: u16,
    pub day: u16,
}

/// A single timestamp, as stored in the native CLI's `TIMESTAMP_STRUCT`.
///
/// `microsecond` is the source's native sub-second precision; the CLI's `fraction`
/// field (nanoseconds) is derived from it by multiplying by 1000 when a value is
/// written into a buffer (see [`crate::parameters`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub year: i16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub microsecond: u32,
}

/// A typed scalar accepted by [`crate::parameters::RowParameterLoader::add_row`].
///
/// `None` (in the `Option<Value>` rows are built from) denotes SQL `NULL`; there is no
/// `Value::Null` variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(Date),
    Timestamp(Timestamp),
    NarrowString(String),
    WideString(String),
}

impl Value {
    /// The domain-level type tag this value would be bound as.
    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Integer(_) => TypeCode::Integer,
            Value::Float(_) => TypeCode::FloatingPoint,
            Value::Boolean(_) => TypeCode::Boolean,
            Value::Date(_) => TypeCode::Date,
            Value::Timestamp(_) => TypeCode::Timestamp,
            Value::NarrowString(_) => TypeCode::NarrowString,
            Value::WideString(_) => TypeCode::WideString,
        }
    }

    /// The "size" of this value as fed into `bytes_required`/the growth strategy:
    /// byte length for narrow strings, UTF-16 code-unit count for wide strings, and
    /// the fixed payload size (the terminator/null handling is applied by the
    /// caller) for every other type.
    pub fn size_hint(&self) -> usize {
        match self {
            Value::Integer(_) => std::mem::size_of::<i64>(),
            Value::Float(_) => std::mem::size_of::<f64>(),
            Value::Boolean(_) => 1,
            Value::Date(_) => crate::buffers::DATE_STRUCT_SIZE,
            Value::Timestamp(_) => crate::buffers::TIMESTAMP_STRUCT_SIZE,
            Value::NarrowString(s) => s.len(),
            Value::WideString(s) => s.encode_utf16().count(),
        }
    }
}
