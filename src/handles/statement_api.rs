use odbc_sys::{CDataType, Len, Pointer, SqlDataType};

use crate::Error;

use super::statement::{ColumnDescription, Statement};

/// The subset of [`Statement`] the parameter-set and result-set engines build on.
///
/// Factored out as a trait (rather than the engines taking a concrete [`Statement`]
/// directly) so tests can swap in a hand-written mock of the native CLI instead of driving a
/// real driver manager -- the "virtual dispatch swapped for a trait" strategy called for in
/// DESIGN.md for this crate's interfaces that genuinely need more than one implementation.
pub trait StatementApi: Send {
    fn number_of_parameters(&self) -> Result<i16, Error>;
    fn number_of_columns(&self) -> Result<i16, Error>;
    fn describe_parameter(&self, parameter_number: u16) -> Result<ColumnDescription, Error>;
    fn describe_column(&self, column_number: u16) -> Result<ColumnDescription, Error>;

    /// # Safety
    /// See [`Statement::bind_input_parameter`].
    #[allow(clippy::too_many_arguments)]
    unsafe fn bind_input_parameter(
        &self,
        parameter_number: u16,
        c_type: CDataType,
        sql_type: SqlDataType,
        column_size: usize,
        decimal_digits: i16,
        value_ptr: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> Result<(), Error>;

    /// # Safety
    /// See [`Statement::bind_col`].
    unsafe fn bind_col(
        &self,
        column_number: u16,
        target_type: CDataType,
        value_ptr: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> Result<(), Error>;

    fn set_row_array_size(&self, size: usize) -> Result<(), Error>;
    fn set_param_set_size(&self, size: usize) -> Result<(), Error>;

    /// # Safety
    /// See [`Statement::set_rows_fetched_ptr`].
    unsafe fn set_rows_fetched_ptr(&self, ptr: *mut usize) -> Result<(), Error>;

    /// # Safety
    /// See [`Statement::set_params_processed_ptr`].
    unsafe fn set_params_processed_ptr(&self, ptr: *mut usize) -> Result<(), Error>;

    /// Executes the previously prepared statement. `true` if a result set was produced.
    fn execute_prepared(&self) -> Result<bool, Error>;

    /// Fetches the next row array. `true` unless the CLI reported `SQL_NO_DATA`.
    fn fetch_next_batch(&self) -> Result<bool, Error>;
}

impl StatementApi for Statement {
    fn number_of_parameters(&self) -> Result<i16, Error> {
        Statement::number_of_parameters(self)
    }

    fn number_of_columns(&self) -> Result<i16, Error> {
        Statement::number_of_columns(self)
    }

    fn describe_parameter(&self, parameter_number: u16) -> Result<ColumnDescription, Error> {
        Statement::describe_parameter(self, parameter_number)
    }

    fn describe_column(&self, column_number: u16) -> Result<ColumnDescription, Error> {
        Statement::describe_column(self, column_number)
    }

    unsafe fn bind_input_parameter(
        &self,
        parameter_number: u16,
        c_type: CDataType,
        sql_type: SqlDataType,
        column_size: usize,
        decimal_digits: i16,
        value_ptr: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> Result<(), Error> {
        unsafe {
            Statement::bind_input_parameter(
                self,
                parameter_number,
                c_type,
                sql_type,
                column_size,
                decimal_digits,
                value_ptr,
                buffer_length,
                indicator,
            )
        }
    }

    unsafe fn bind_col(
        &self,
        column_number: u16,
        target_type: CDataType,
        value_ptr: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> Result<(), Error> {
        unsafe {
            Statement::bind_col(
                self,
                column_number,
                target_type,
                value_ptr,
                buffer_length,
                indicator,
            )
        }
    }

    fn set_row_array_size(&self, size: usize) -> Result<(), Error> {
        Statement::set_row_array_size(self, size)
    }

    fn set_param_set_size(&self, size: usize) -> Result<(), Error> {
        Statement::set_param_set_size(self, size)
    }

    unsafe fn set_rows_fetched_ptr(&self, ptr: *mut usize) -> Result<(), Error> {
        unsafe { Statement::set_rows_fetched_ptr(self, ptr) }
    }

    unsafe fn set_params_processed_ptr(&self, ptr: *mut usize) -> Result<(), Error> {
        unsafe { Statement::set_params_processed_ptr(self, ptr) }
    }

    fn execute_prepared(&self) -> Result<bool, Error> {
        Statement::execute_prepared(self)
    }

    fn fetch_next_batch(&self) -> Result<bool, Error> {
        Statement::fetch_next_batch(self)
    }
}
