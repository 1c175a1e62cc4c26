use std::{cell::Cell, sync::Arc};

use odbc_sys::{
    CDataType, FetchOrientation, FreeStmtOption, Handle, HandleType, Len, Nullable, ParamType,
    Pointer, SQLBindCol, SQLBindParameter, SQLDescribeColW, SQLDescribeParam, SQLExecDirectW,
    SQLExecute, SQLFetchScroll, SQLFreeStmt, SQLMoreResults, SQLNumParams, SQLNumResultCols,
    SQLPrepareW, SQLRowCount, SQLSetStmtAttrW, SqlDataType, StatementAttribute,
};
use widestring::{U16Str, U16String};

use crate::Error;

use super::{as_handle::AsHandle, connection::Connection, drop_handle, sql_result::SqlResult};

/// Description of a result column or a bound parameter, as returned by
/// `SQLDescribeCol`/`SQLDescribeParam`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: SqlDataType,
    pub size: usize,
    pub decimal_digits: i16,
    /// `true` for both `NULLABLE` and `NULLABLE_UNKNOWN` -- the distinction between
    /// "definitely nullable" and "the driver doesn't know" is deliberately collapsed,
    /// matching the source this design follows.
    pub allows_null: bool,
}

fn allows_null(nullable: Nullable) -> bool {
    !matches!(nullable, Nullable::NO_NULLS)
}

/// An allocated ODBC statement handle.
///
/// Keeps its parent [`Connection`] alive through a shared, strong reference, and is
/// `Send` so it can be handed off in full to the background reader thread of a
/// [`crate::results::DoubleBufferedResultSet`] -- exactly one side (this thread, or
/// that one) ever touches it at a time.
pub struct Statement {
    handle: Handle,
    #[allow(dead_code)]
    connection: Arc<Connection>,
    finalized: Cell<bool>,
}

unsafe impl Send for Statement {}

impl AsHandle for Statement {
    fn as_handle(&self) -> Handle {
        self.handle
    }

    fn handle_type(&self) -> HandleType {
        HandleType::Stmt
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        if !self.finalized.get() {
            drop_handle(self.handle, HandleType::Stmt);
        }
    }
}

impl Statement {
    /// Allocates a statement under `connection`.
    pub fn new(connection: Arc<Connection>) -> Result<Self, Error> {
        let handle = connection.allocate_statement()?;
        Ok(Statement {
            handle,
            connection,
            finalized: Cell::new(false),
        })
    }

    fn check_not_finalized(&self) -> Result<(), Error> {
        if self.finalized.get() {
            Err(Error::LogicError(
                "Operation attempted on a finalized statement.".to_owned(),
            ))
        } else {
            Ok(())
        }
    }

    /// Explicitly frees the statement handle. Idempotent: a second call is a no-op.
    /// Unlike the implicit free on drop, a failure here is surfaced to the caller.
    pub fn finalize(&self) -> Result<(), Error> {
        if self.finalized.replace(true) {
            return Ok(());
        }
        let ret = unsafe { odbc_sys::SQLFreeHandle(HandleType::Stmt, self.handle) };
        SqlResult::new(ret, || ()).into_result(self, "SQLFreeHandle")
    }

    pub fn prepare(&self, sql: &U16Str) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe { SQLPrepareW(self.handle, sql.as_ptr(), sql.len() as i32) };
        SqlResult::new(ret, || ()).into_result(self, "SQLPrepareW")
    }

    pub fn prepare_str(&self, sql: &str) -> Result<(), Error> {
        self.prepare(&U16String::from_str(sql))
    }

    /// Executes the previously prepared statement. Returns `true` if a result set was
    /// produced, `false` on `SQL_NO_DATA`.
    pub fn execute_prepared(&self) -> Result<bool, Error> {
        self.check_not_finalized()?;
        let ret = unsafe { SQLExecute(self.handle) };
        Ok(SqlResult::new(ret, || ())
            .into_opt_result(self, "SQLExecute")?
            .is_some())
    }

    /// Prepares and executes `sql` in one round trip. Returns `true` if a result set
    /// was produced.
    pub fn execute_direct(&self, sql: &U16Str) -> Result<bool, Error> {
        self.check_not_finalized()?;
        let ret = unsafe { SQLExecDirectW(self.handle, sql.as_ptr(), sql.len() as i32) };
        Ok(SqlResult::new(ret, || ())
            .into_opt_result(self, "SQLExecDirectW")?
            .is_some())
    }

    /// # Safety
    /// `value_ptr` and `indicator` must remain valid and exclusively owned by this
    /// statement for as long as the binding is active (until unbound, rebound, or the
    /// statement is freed).
    pub unsafe fn bind_col(
        &self,
        column_number: u16,
        target_type: CDataType,
        value_ptr: Pointer,
        buffer_length: Len,
        indicator: *mut Len,
    ) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe {
            SQLBindCol(
                self.handle,
                column_number,
                target_type,
                value_ptr,
                buffer_length,
                indicator,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLBindCol")
    }

    /// # Safety
    /// Same contract as [`Statement::bind_col`], applied to an input parameter slot.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn bind_input_parameter(
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
        self.check_not_finalized()?;
        let ret = unsafe {
            SQLBindParameter(
                self.handle,
                parameter_number,
                ParamType::Input,
                c_type,
                sql_type,
                column_size,
                decimal_digits,
                value_ptr,
                buffer_length,
                indicator,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLBindParameter")
    }

    pub fn set_row_array_size(&self, size: usize) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe {
            SQLSetStmtAttrW(
                self.handle,
                StatementAttribute::RowArraySize,
                size as Pointer,
                0,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLSetStmtAttrW(ROW_ARRAY_SIZE)")
    }

    pub fn set_param_set_size(&self, size: usize) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe {
            SQLSetStmtAttrW(
                self.handle,
                StatementAttribute::ParamsetSize,
                size as Pointer,
                0,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLSetStmtAttrW(PARAMSET_SIZE)")
    }

    /// # Safety
    /// `ptr` must remain valid for as long as it stays registered with the statement.
    pub unsafe fn set_rows_fetched_ptr(&self, ptr: *mut usize) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe {
            SQLSetStmtAttrW(
                self.handle,
                StatementAttribute::RowsFetchedPtr,
                ptr as Pointer,
                0,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLSetStmtAttrW(ROWS_FETCHED_PTR)")
    }

    /// # Safety
    /// `ptr` must remain valid for as long as it stays registered with the statement.
    pub unsafe fn set_params_processed_ptr(&self, ptr: *mut usize) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe {
            SQLSetStmtAttrW(
                self.handle,
                StatementAttribute::ParamsProcessedPtr,
                ptr as Pointer,
                0,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLSetStmtAttrW(PARAMS_PROCESSED_PTR)")
    }

    pub fn number_of_columns(&self) -> Result<i16, Error> {
        self.check_not_finalized()?;
        let mut count: i16 = 0;
        let ret = unsafe { SQLNumResultCols(self.handle, &mut count) };
        SqlResult::new(ret, || count).into_result(self, "SQLNumResultCols")
    }

    pub fn number_of_parameters(&self) -> Result<i16, Error> {
        self.check_not_finalized()?;
        let mut count: i16 = 0;
        let ret = unsafe { SQLNumParams(self.handle, &mut count) };
        SqlResult::new(ret, || count).into_result(self, "SQLNumParams")
    }

    pub fn row_count(&self) -> Result<Len, Error> {
        self.check_not_finalized()?;
        let mut count: Len = 0;
        let ret = unsafe { SQLRowCount(self.handle, &mut count) };
        SqlResult::new(ret, || count).into_result(self, "SQLRowCount")
    }

    /// Fetches the next row array. Returns `false` on `SQL_NO_DATA`.
    pub fn fetch_next_batch(&self) -> Result<bool, Error> {
        self.check_not_finalized()?;
        let ret = unsafe { SQLFetchScroll(self.handle, FetchOrientation::Next, 0) };
        Ok(SqlResult::new(ret, || ())
            .into_opt_result(self, "SQLFetchScroll")?
            .is_some())
    }

    /// Advances to the next result set. Returns `false` on `SQL_NO_DATA`.
    pub fn more_results(&self) -> Result<bool, Error> {
        self.check_not_finalized()?;
        let ret = unsafe { SQLMoreResults(self.handle) };
        Ok(SqlResult::new(ret, || ())
            .into_opt_result(self, "SQLMoreResults")?
            .is_some())
    }

    pub fn describe_column(&self, column_number: u16) -> Result<ColumnDescription, Error> {
        self.check_not_finalized()?;
        let mut name = vec![0u16; 256];
        let mut name_length: i16 = 0;
        let mut data_type = SqlDataType::UNKNOWN_TYPE;
        let mut column_size: odbc_sys::ULen = 0;
        let mut decimal_digits: i16 = 0;
        let mut nullable = Nullable::UNKNOWN;
        let ret = unsafe {
            SQLDescribeColW(
                self.handle,
                column_number,
                name.as_mut_ptr(),
                name.len() as i16,
                &mut name_length,
                &mut data_type,
                &mut column_size,
                &mut decimal_digits,
                &mut nullable,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLDescribeColW")?;
        name.truncate((name_length as usize).min(name.len()));
        Ok(ColumnDescription {
            name: U16Str::from_slice(&name).to_string_lossy(),
            data_type,
            size: column_size as usize,
            decimal_digits,
            allows_null: allows_null(nullable),
        })
    }

    pub fn describe_parameter(&self, parameter_number: u16) -> Result<ColumnDescription, Error> {
        self.check_not_finalized()?;
        let mut data_type = SqlDataType::UNKNOWN_TYPE;
        let mut parameter_size: odbc_sys::ULen = 0;
        let mut decimal_digits: i16 = 0;
        let mut nullable = Nullable::UNKNOWN;
        let ret = unsafe {
            SQLDescribeParam(
                self.handle,
                parameter_number,
                &mut data_type,
                &mut parameter_size,
                &mut decimal_digits,
                &mut nullable,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLDescribeParam")?;
        Ok(ColumnDescription {
            name: String::new(),
            data_type,
            size: parameter_size as usize,
            decimal_digits,
            allows_null: allows_null(nullable),
        })
    }

    fn free_statement(&self, option: FreeStmtOption) -> Result<(), Error> {
        self.check_not_finalized()?;
        let ret = unsafe { SQLFreeStmt(self.handle, option) };
        SqlResult::new(ret, || ()).into_result(self, "SQLFreeStmt")
    }

    pub fn close_cursor(&self) -> Result<(), Error> {
        self.free_statement(FreeStmtOption::Close)
    }

    pub fn unbind_all_columns(&self) -> Result<(), Error> {
        self.free_statement(FreeStmtOption::Unbind)
    }

    pub fn unbind_all_parameters(&self) -> Result<(), Error> {
        self.free_statement(FreeStmtOption::ResetParams)
    }
}
