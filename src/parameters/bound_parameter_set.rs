use std::sync::Arc;

use odbc_sys::{Len, Pointer};

use crate::{
    buffers::{make_description, make_fallback_description, Description, Kind, MultiValueBuffer, TypeCode},
    handles::StatementApi,
    Error, Options,
};

/// Initial character capacity given to a described string parameter, regardless of
/// what the driver reports. Most parameter values are short; [`RowParameterLoader`]
/// grows a slot's buffer on demand the first time a wider value shows up.
///
/// [`RowParameterLoader`]: super::RowParameterLoader
const INITIAL_PARAM_STRING_LEN: usize = 16;

fn clamp_initial_string_length(kind: Kind) -> Kind {
    match kind {
        Kind::NarrowString { max_chars } => Kind::NarrowString {
            max_chars: max_chars.min(INITIAL_PARAM_STRING_LEN),
        },
        Kind::WideString { max_code_units } => Kind::WideString {
            max_code_units: max_code_units.min(INITIAL_PARAM_STRING_LEN),
        },
        other => other,
    }
}

/// One bound parameter slot: its resolved shape and the buffer backing it.
pub struct BoundParameter {
    pub description: Description,
    pub buffer: MultiValueBuffer,
}

fn bind_parameter<S: StatementApi + ?Sized>(
    statement: &S,
    parameter_number: u16,
    description: &Description,
    buffer: &mut MultiValueBuffer,
) -> Result<(), Error> {
    let buffer_length = buffer.element_size() as Len;
    let value_ptr = buffer.data_mut_ptr() as Pointer;
    let indicator = buffer.indicators_ptr();
    unsafe {
        statement.bind_input_parameter(
            parameter_number,
            description.c_type_code(),
            description.sql_type_code(),
            description.kind.bind_size(),
            description.decimal_digits(),
            value_ptr,
            buffer_length,
            indicator,
        )
    }
}

fn describe_or_fallback<S: StatementApi>(
    statement: &S,
    parameter_number: u16,
    options: &Options,
) -> Description {
    let described = statement
        .describe_parameter(parameter_number)
        .and_then(|column| make_description(&column, options));
    let kind = match described {
        Ok(description) => clamp_initial_string_length(description.kind),
        Err(_) => make_fallback_description(options.prefer_unicode),
    };
    Description {
        kind,
        name: String::new(),
        nullable: true,
    }
}

/// A prepared statement's input parameters, bound as column-oriented batch buffers.
///
/// Holds up to `buffered_sets` rows per [`Self::execute_batch`] round trip. Individual
/// slots are resized in place (see [`Self::rebind`]) when [`super::RowParameterLoader`]
/// encounters a value too wide for a slot's current buffer.
pub struct BoundParameterSet<S> {
    statement: Arc<S>,
    parameters: Vec<BoundParameter>,
    buffered_sets: usize,
    transferred_sets: usize,
    confirmed_last_batch: Box<usize>,
    initial_parameter_types: Vec<TypeCode>,
}

impl<S: StatementApi> BoundParameterSet<S> {
    /// Describes and binds every parameter of `statement`'s prepared SQL text, with
    /// `buffered_sets` rows of slack in each slot.
    pub fn new(statement: Arc<S>, buffered_sets: usize, options: &Options) -> Result<Self, Error> {
        let count = statement.number_of_parameters()?;
        let mut parameters = Vec::with_capacity(count.max(0) as usize);
        for index in 1..=count {
            let description = describe_or_fallback(statement.as_ref(), index as u16, options);
            let mut buffer = MultiValueBuffer::new(description.element_size(), buffered_sets)?;
            bind_parameter(statement.as_ref(), index as u16, &description, &mut buffer)?;
            parameters.push(BoundParameter { description, buffer });
        }

        let mut confirmed_last_batch = Box::new(0usize);
        if !parameters.is_empty() {
            unsafe {
                statement.set_params_processed_ptr(confirmed_last_batch.as_mut() as *mut usize)?;
            }
        }

        let initial_parameter_types = parameters.iter().map(|p| p.description.type_code()).collect();

        Ok(BoundParameterSet {
            statement,
            parameters,
            buffered_sets,
            transferred_sets: 0,
            confirmed_last_batch,
            initial_parameter_types,
        })
    }

    /// Rebinds parameter slot `index` (0-based) to `kind`, discarding whatever was
    /// buffered in it. The caller is responsible for re-populating rows that were lost.
    pub fn rebind(&mut self, index: usize, kind: Kind) -> Result<(), Error> {
        let name = self.parameters[index].description.name.clone();
        let nullable = self.parameters[index].description.nullable;
        let description = Description { kind, name, nullable };
        let mut buffer = MultiValueBuffer::new(description.element_size(), self.buffered_sets)?;
        bind_parameter(
            self.statement.as_ref(),
            (index + 1) as u16,
            &description,
            &mut buffer,
        )?;
        self.parameters[index] = BoundParameter { description, buffer };
        Ok(())
    }

    /// Executes the prepared statement against the first `n` buffered rows.
    ///
    /// A no-op if `n` is zero or the statement takes no parameters. Fails with
    /// [`Error::LogicError`] if `n` exceeds [`Self::buffered_sets`].
    pub fn execute_batch(&mut self, n: usize) -> Result<(), Error> {
        if n == 0 || self.parameters.is_empty() {
            return Ok(());
        }
        if n > self.buffered_sets {
            return Err(Error::LogicError(format!(
                "Cannot execute a batch of {n} rows against a parameter set buffered for {}.",
                self.buffered_sets
            )));
        }
        self.statement.set_param_set_size(n)?;
        self.statement.execute_prepared()?;
        self.transferred_sets += *self.confirmed_last_batch;
        Ok(())
    }

    pub fn buffered_sets(&self) -> usize {
        self.buffered_sets
    }

    pub fn transferred_sets(&self) -> usize {
        self.transferred_sets
    }

    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    pub fn initial_parameter_types(&self) -> &[TypeCode] {
        &self.initial_parameter_types
    }

    pub(crate) fn buffer_mut(&mut self, index: usize) -> &mut MultiValueBuffer {
        &mut self.parameters[index].buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handles::ColumnDescription, test_support::MockStatement};
    use odbc_sys::SqlDataType;

    fn integer_column() -> ColumnDescription {
        ColumnDescription {
            name: String::new(),
            data_type: SqlDataType::EXT_BIG_INT,
            size: 0,
            decimal_digits: 0,
            allows_null: true,
        }
    }

    #[test]
    fn binds_every_described_parameter_on_construction() {
        let statement = Arc::new(
            MockStatement::new().with_parameters(vec![Ok(integer_column()), Ok(integer_column())]),
        );
        let set = BoundParameterSet::new(statement.clone(), 10, &Options::default()).unwrap();
        assert_eq!(set.number_of_parameters(), 2);
        assert_eq!(statement.bind_calls().len(), 2);
    }

    #[test]
    fn falls_back_to_one_character_string_when_describe_fails() {
        let statement = Arc::new(MockStatement::new().with_parameters(vec![Err(())]));
        let set = BoundParameterSet::new(statement, 10, &Options::default()).unwrap();
        assert_eq!(set.parameters()[0].description.type_code(), TypeCode::NarrowString);
        assert_eq!(set.parameters()[0].description.element_size(), 2);
    }

    #[test]
    fn clamps_initial_string_capacity() {
        let wide_varchar = ColumnDescription {
            name: String::new(),
            data_type: SqlDataType::VARCHAR,
            size: 4000,
            decimal_digits: 0,
            allows_null: true,
        };
        let statement = Arc::new(MockStatement::new().with_parameters(vec![Ok(wide_varchar)]));
        let set = BoundParameterSet::new(statement, 10, &Options::default()).unwrap();
        assert_eq!(
            set.parameters()[0].description.element_size(),
            INITIAL_PARAM_STRING_LEN + 1
        );
    }

    #[test]
    fn execute_batch_rejects_more_rows_than_buffered() {
        let statement = Arc::new(MockStatement::new().with_parameters(vec![Ok(integer_column())]));
        let mut set = BoundParameterSet::new(statement, 4, &Options::default()).unwrap();
        let err = set.execute_batch(5).unwrap_err();
        assert!(matches!(err, Error::LogicError(_)));
    }

    #[test]
    fn execute_batch_is_a_no_op_for_a_parameterless_statement() {
        let statement = Arc::new(MockStatement::new());
        let mut set = BoundParameterSet::new(statement.clone(), 4, &Options::default()).unwrap();
        set.execute_batch(3).unwrap();
        assert_eq!(statement.execute_calls.get(), 0);
    }

    #[test]
    fn execute_batch_accumulates_transferred_sets() {
        let statement = Arc::new(MockStatement::new().with_parameters(vec![Ok(integer_column())]));
        let mut set = BoundParameterSet::new(statement, 4, &Options::default()).unwrap();
        set.execute_batch(3).unwrap();
        assert_eq!(set.transferred_sets(), 3);
    }

    #[test]
    fn rebind_replaces_slot_with_a_wider_buffer() {
        let statement = Arc::new(MockStatement::new().with_parameters(vec![Ok(integer_column())]));
        let mut set = BoundParameterSet::new(statement, 4, &Options::default()).unwrap();
        set.rebind(0, Kind::NarrowString { max_chars: 30 }).unwrap();
        assert_eq!(set.parameters()[0].description.element_size(), 31);
    }
}
