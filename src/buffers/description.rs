use odbc_sys::{CDataType, SqlDataType};

use crate::{handles::ColumnDescription, Error, Options};

/// Fixed byte size of the native CLI's `DATE_STRUCT`: three `i16`/`u16` fields.
pub const DATE_STRUCT_SIZE: usize = 6;
/// Fixed byte size of the native CLI's `TIMESTAMP_STRUCT`: the date fields, three more
/// `u16` time fields, and a 4-byte nanosecond fraction.
pub const TIMESTAMP_STRUCT_SIZE: usize = 16;

/// A coarse, domain-level type tag independent of any particular CLI type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeCode {
    Integer,
    FloatingPoint,
    Boolean,
    Date,
    Timestamp,
    NarrowString,
    WideString,
}

/// The variant-specific shape of a [`Description`]: how many bytes one element needs
/// and which native CLI type codes it is bound with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Integer,
    FloatingPoint,
    Boolean,
    Date,
    Timestamp,
    /// `max_chars` excludes the null terminator.
    NarrowString { max_chars: usize },
    /// `max_code_units` excludes the null terminator, counted in UTF-16 code units.
    WideString { max_code_units: usize },
}

impl Kind {
    pub fn type_code(&self) -> TypeCode {
        match self {
            Kind::Integer => TypeCode::Integer,
            Kind::FloatingPoint => TypeCode::FloatingPoint,
            Kind::Boolean => TypeCode::Boolean,
            Kind::Date => TypeCode::Date,
            Kind::Timestamp => TypeCode::Timestamp,
            Kind::NarrowString { .. } => TypeCode::NarrowString,
            Kind::WideString { .. } => TypeCode::WideString,
        }
    }

    /// Byte size of one buffer element, including a string's terminator.
    pub fn element_size(&self) -> usize {
        match self {
            Kind::Integer => std::mem::size_of::<i64>(),
            Kind::FloatingPoint => std::mem::size_of::<f64>(),
            Kind::Boolean => 1,
            Kind::Date => DATE_STRUCT_SIZE,
            Kind::Timestamp => TIMESTAMP_STRUCT_SIZE,
            Kind::NarrowString { max_chars } => max_chars + 1,
            Kind::WideString { max_code_units } => 2 * (max_code_units + 1),
        }
    }

    pub fn c_type_code(&self) -> CDataType {
        match self {
            Kind::Integer => CDataType::SBigInt,
            Kind::FloatingPoint => CDataType::Double,
            Kind::Boolean => CDataType::Bit,
            Kind::Date => CDataType::TypeDate,
            Kind::Timestamp => CDataType::TypeTimestamp,
            Kind::NarrowString { .. } => CDataType::Char,
            Kind::WideString { .. } => CDataType::WChar,
        }
    }

    pub fn sql_type_code(&self) -> SqlDataType {
        match self {
            Kind::Integer => SqlDataType::EXT_BIG_INT,
            Kind::FloatingPoint => SqlDataType::DOUBLE,
            Kind::Boolean => SqlDataType::EXT_BIT,
            Kind::Date => SqlDataType::DATE,
            Kind::Timestamp => SqlDataType::TIMESTAMP,
            Kind::NarrowString { .. } => SqlDataType::VARCHAR,
            Kind::WideString { .. } => SqlDataType::EXT_W_VARCHAR,
        }
    }

    pub fn decimal_digits(&self) -> i16 {
        match self {
            Kind::Timestamp => 6,
            _ => 0,
        }
    }

    /// The `column_size` argument `SQLBindParameter` expects: a character count for strings,
    /// the element size otherwise.
    pub fn bind_size(&self) -> usize {
        match self {
            Kind::NarrowString { max_chars } => *max_chars,
            Kind::WideString { max_code_units } => *max_code_units,
            _ => self.element_size(),
        }
    }
}

/// A fully resolved column/parameter type: the shape ([`Kind`]) plus the describing
/// metadata a caller needs (`name`, `nullable`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Description {
    pub kind: Kind,
    pub name: String,
    pub nullable: bool,
}

impl Description {
    pub fn type_code(&self) -> TypeCode {
        self.kind.type_code()
    }

    pub fn element_size(&self) -> usize {
        self.kind.element_size()
    }

    pub fn c_type_code(&self) -> CDataType {
        self.kind.c_type_code()
    }

    pub fn sql_type_code(&self) -> SqlDataType {
        self.kind.sql_type_code()
    }

    pub fn decimal_digits(&self) -> i16 {
        self.kind.decimal_digits()
    }

    /// Whether a runtime value of `type_code` and `size` (see [`crate::Value::size_hint`])
    /// still fits this slot's current buffer without a rebind: the type must match exactly,
    /// and [`bytes_required`] must not exceed [`Description::element_size`].
    pub fn is_suitable_for(&self, type_code: TypeCode, size: usize) -> bool {
        self.type_code() == type_code && bytes_required(type_code, size) <= self.element_size()
    }
}

/// Number of buffer-element bytes a value of `type_code` and `size` (byte length for narrow
/// strings, UTF-16 code-unit count for wide strings, meaningless for every other type) would
/// need, including a string's terminator.
pub fn bytes_required(type_code: TypeCode, size: usize) -> usize {
    match type_code {
        TypeCode::NarrowString => size + 1,
        TypeCode::WideString => 2 * size + 2,
        TypeCode::Integer => std::mem::size_of::<i64>(),
        TypeCode::FloatingPoint => std::mem::size_of::<f64>(),
        TypeCode::Boolean => 1,
        TypeCode::Date => DATE_STRUCT_SIZE,
        TypeCode::Timestamp => TIMESTAMP_STRUCT_SIZE,
    }
}

/// String-size growth strategy applied both to the initial sizing of a described
/// column/parameter and to a rebind triggered by a runtime value that no longer fits.
fn grow(size: usize) -> usize {
    (10usize).max((1.2 * size as f64).ceil() as usize)
}

fn string_kind(max_chars: usize, wide: bool) -> Kind {
    if wide {
        Kind::WideString {
            max_code_units: max_chars,
        }
    } else {
        Kind::NarrowString { max_chars }
    }
}

/// Maps a column or parameter description, as reported by the native CLI, to a
/// [`Description`]. Applies the sizing/unicode policy from `options`.
pub fn make_description(
    column: &ColumnDescription,
    options: &Options,
) -> Result<Description, Error> {
    let size = column.size;
    let kind = match column.data_type {
        SqlDataType::EXT_TINY_INT
        | SqlDataType::SMALLINT
        | SqlDataType::INTEGER
        | SqlDataType::EXT_BIG_INT => Kind::Integer,
        SqlDataType::REAL | SqlDataType::FLOAT | SqlDataType::DOUBLE => Kind::FloatingPoint,
        SqlDataType::EXT_BIT => Kind::Boolean,
        SqlDataType::DATE => Kind::Date,
        SqlDataType::TIMESTAMP => Kind::Timestamp,
        SqlDataType::CHAR | SqlDataType::VARCHAR | SqlDataType::EXT_LONG_VARCHAR => {
            string_size_kind(size, options.prefer_unicode, options)
        }
        SqlDataType::EXT_W_CHAR | SqlDataType::EXT_W_VARCHAR | SqlDataType::EXT_W_LONG_VARCHAR => {
            string_size_kind(size, !options.fetch_wchar_as_char, options)
        }
        SqlDataType::NUMERIC | SqlDataType::DECIMAL if size <= 18 && column.decimal_digits == 0 => {
            Kind::Integer
        }
        SqlDataType::NUMERIC | SqlDataType::DECIMAL if size <= 18 => Kind::FloatingPoint,
        SqlDataType::NUMERIC | SqlDataType::DECIMAL => {
            if options.large_decimals_as_64_bit_types {
                if column.decimal_digits == 0 {
                    Kind::Integer
                } else {
                    Kind::FloatingPoint
                }
            } else {
                string_size_kind(size + 2, options.prefer_unicode, options)
            }
        }
        other => {
            return Err(Error::UnsupportedType {
                sql_type: other.0 as i16,
            })
        }
    };
    Ok(Description {
        kind,
        name: column.name.clone(),
        nullable: column.allows_null,
    })
}

fn string_size_kind(reported_size: usize, wide: bool, options: &Options) -> Kind {
    let mut size = if reported_size == 0 {
        options.varchar_max_character_limit
    } else {
        reported_size
    };
    if options.limit_varchar_results_to_max {
        size = size.min(options.varchar_max_character_limit);
    }
    if options.force_extra_capacity_for_unicode && wide {
        size *= 2;
    }
    string_kind(size, wide)
}

/// Describes a slot whose buffer must grow to fit a runtime value of `type_code` and
/// `size` (used when rebinding a parameter after a suitability failure).
pub fn make_description_for_type(type_code: TypeCode, size: usize) -> Kind {
    match type_code {
        TypeCode::Integer => Kind::Integer,
        TypeCode::FloatingPoint => Kind::FloatingPoint,
        TypeCode::Boolean => Kind::Boolean,
        TypeCode::Date => Kind::Date,
        TypeCode::Timestamp => Kind::Timestamp,
        TypeCode::NarrowString => string_kind(grow(size), false),
        TypeCode::WideString => string_kind(grow(size), true),
    }
}

/// Describes a one-character fallback slot used when `describe_parameter` is
/// unavailable or fails.
pub fn make_fallback_description(prefer_unicode: bool) -> Kind {
    string_kind(1, prefer_unicode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn column(data_type: SqlDataType, size: usize, decimal_digits: i16) -> ColumnDescription {
        ColumnDescription {
            name: "c".to_owned(),
            data_type,
            size,
            decimal_digits,
            allows_null: true,
        }
    }

    #[test_case(SqlDataType::EXT_TINY_INT, TypeCode::Integer; "tinyint")]
    #[test_case(SqlDataType::SMALLINT, TypeCode::Integer; "smallint")]
    #[test_case(SqlDataType::INTEGER, TypeCode::Integer; "integer")]
    #[test_case(SqlDataType::EXT_BIG_INT, TypeCode::Integer; "bigint")]
    #[test_case(SqlDataType::REAL, TypeCode::FloatingPoint; "real")]
    #[test_case(SqlDataType::FLOAT, TypeCode::FloatingPoint; "float")]
    #[test_case(SqlDataType::DOUBLE, TypeCode::FloatingPoint; "double")]
    #[test_case(SqlDataType::EXT_BIT, TypeCode::Boolean; "bit")]
    #[test_case(SqlDataType::DATE, TypeCode::Date; "date")]
    #[test_case(SqlDataType::TIMESTAMP, TypeCode::Timestamp; "timestamp")]
    #[test_case(SqlDataType::CHAR, TypeCode::NarrowString; "char")]
    #[test_case(SqlDataType::VARCHAR, TypeCode::NarrowString; "varchar")]
    fn maps_known_type_codes(data_type: SqlDataType, expected: TypeCode) {
        let options = Options::default();
        let description = make_description(&column(data_type, 10, 0), &options).unwrap();
        assert_eq!(description.type_code(), expected);
    }

    #[test]
    fn timestamp_has_six_decimal_digits() {
        let options = Options::default();
        let description =
            make_description(&column(SqlDataType::TIMESTAMP, 0, 0), &options).unwrap();
        assert_eq!(description.decimal_digits(), 6);
    }

    #[test]
    fn unknown_type_code_is_unsupported() {
        let options = Options::default();
        let err = make_description(&column(SqlDataType::UNKNOWN_TYPE, 0, 0), &options)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }

    #[test_case(0, 0, TypeCode::Integer; "small precision zero scale is integer")]
    #[test_case(18, 0, TypeCode::Integer; "precision 18 zero scale is integer")]
    #[test_case(18, 2, TypeCode::FloatingPoint; "precision 18 nonzero scale is float")]
    fn numeric_routes_by_precision_and_scale(
        size: usize,
        decimal_digits: i16,
        expected: TypeCode,
    ) {
        let options = Options::default();
        let description =
            make_description(&column(SqlDataType::NUMERIC, size, decimal_digits), &options)
                .unwrap();
        assert_eq!(description.type_code(), expected);
    }

    #[test]
    fn large_numeric_falls_back_to_narrow_string() {
        let options = Options::default();
        let description = make_description(&column(SqlDataType::NUMERIC, 30, 2), &options)
            .unwrap();
        assert_eq!(description.type_code(), TypeCode::NarrowString);
        assert_eq!(description.element_size(), 30 + 2 + 1);
    }

    #[test_case(0, TypeCode::Integer; "zero scale routes to integer")]
    #[test_case(2, TypeCode::FloatingPoint; "nonzero scale routes to float")]
    fn large_numeric_as_64_bit_types_routes_by_scale_like_the_small_decimal_rule(
        decimal_digits: i16,
        expected: TypeCode,
    ) {
        let mut options = Options::default();
        options.large_decimals_as_64_bit_types = true;
        let description =
            make_description(&column(SqlDataType::NUMERIC, 30, decimal_digits), &options)
                .unwrap();
        assert_eq!(description.type_code(), expected);
    }

    #[test]
    fn zero_sized_varchar_uses_configured_limit() {
        let mut options = Options::default();
        options.varchar_max_character_limit = 50;
        let description = make_description(&column(SqlDataType::VARCHAR, 0, 0), &options)
            .unwrap();
        assert_eq!(description.element_size(), 51);
    }

    #[test]
    fn growth_strategy_matches_spec() {
        assert_eq!(grow(5), 10);
        assert_eq!(grow(100), 120);
    }

    #[test]
    fn narrow_string_is_suitable_only_when_type_and_size_match() {
        let description = Description {
            kind: Kind::NarrowString { max_chars: 5 },
            name: "p".to_owned(),
            nullable: true,
        };
        assert!(description.is_suitable_for(TypeCode::NarrowString, 5));
        assert!(!description.is_suitable_for(TypeCode::NarrowString, 6));
        assert!(!description.is_suitable_for(TypeCode::WideString, 5));
    }

    #[test]
    fn bytes_required_matches_growth_and_terminator_rules() {
        assert_eq!(bytes_required(TypeCode::NarrowString, 5), 6);
        assert_eq!(bytes_required(TypeCode::WideString, 5), 12);
        assert_eq!(bytes_required(TypeCode::Integer, 0), 8);
        assert_eq!(bytes_required(TypeCode::Timestamp, 0), TIMESTAMP_STRUCT_SIZE);
    }
}
