//! A hand-written mock of [`StatementApi`], used by the parameter-set and result-set engines'
//! unit tests in place of a real driver manager (none is available in this environment).

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use odbc_sys::{CDataType, Len, Pointer, SqlDataType};

use crate::{
    handles::{ColumnDescription, StatementApi},
    Error,
};

/// One call recorded by [`MockStatement`], for assertions about what the engines told the
/// (mock) native CLI to do.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BindCall {
    Parameter {
        parameter_number: u16,
        c_type: CDataType,
        sql_type: SqlDataType,
        column_size: usize,
        decimal_digits: i16,
    },
    Column {
        column_number: u16,
        target_type: CDataType,
    },
}

/// A raw pointer the mock writes through on `execute_prepared`/`fetch_next_batch`, to emulate
/// the CLI populating `PARAMS_PROCESSED_PTR`/`ROWS_FETCHED_PTR`. Wrapped so it can cross the
/// `Send` bound `StatementApi` requires; sound here because the mock is only ever driven by one
/// thread at a time, exactly like the real statement handle it stands in for.
#[derive(Clone, Copy)]
struct RawPtr(*mut usize);
unsafe impl Send for RawPtr {}

pub(crate) struct MockStatement {
    pub(crate) number_of_parameters: i16,
    pub(crate) number_of_columns: i16,
    pub(crate) parameter_descriptions: Vec<Result<ColumnDescription, ()>>,
    pub(crate) column_descriptions: Vec<Result<ColumnDescription, ()>>,
    /// Row counts handed back by successive `fetch_next_batch` calls, in order. Exhausted once
    /// empty: the next call reports `SQL_NO_DATA`.
    pub(crate) fetch_batches: RefCell<VecDeque<usize>>,
    pub(crate) bind_calls: RefCell<Vec<BindCall>>,
    pub(crate) row_array_size: Cell<usize>,
    pub(crate) param_set_size: Cell<usize>,
    pub(crate) execute_calls: Cell<usize>,
    /// Rows the mock reports as confirmed by the CLI on the next `execute_prepared` call;
    /// defaults to "every requested row was accepted" (see `new`/`execute_prepared`).
    pub(crate) confirm_override: Cell<Option<usize>>,
    rows_fetched_ptr: Cell<Option<RawPtr>>,
    params_processed_ptr: Cell<Option<RawPtr>>,
}

unsafe impl Send for MockStatement {}

impl MockStatement {
    pub(crate) fn new() -> Self {
        MockStatement {
            number_of_parameters: 0,
            number_of_columns: 0,
            parameter_descriptions: Vec::new(),
            column_descriptions: Vec::new(),
            fetch_batches: RefCell::new(VecDeque::new()),
            bind_calls: RefCell::new(Vec::new()),
            row_array_size: Cell::new(0),
            param_set_size: Cell::new(0),
            execute_calls: Cell::new(0),
            confirm_override: Cell::new(None),
            rows_fetched_ptr: Cell::new(None),
            params_processed_ptr: Cell::new(None),
        }
    }

    pub(crate) fn with_parameters(mut self, descriptions: Vec<Result<ColumnDescription, ()>>) -> Self {
        self.number_of_parameters = descriptions.len() as i16;
        self.parameter_descriptions = descriptions;
        self
    }

    pub(crate) fn with_columns(mut self, descriptions: Vec<ColumnDescription>) -> Self {
        self.number_of_columns = descriptions.len() as i16;
        self.column_descriptions = descriptions.into_iter().map(Ok).collect();
        self
    }

    pub(crate) fn with_fetch_batches(self, batches: impl IntoIterator<Item = usize>) -> Self {
        *self.fetch_batches.borrow_mut() = batches.into_iter().collect();
        self
    }

    pub(crate) fn bind_calls(&self) -> Vec<BindCall> {
        self.bind_calls.borrow().clone()
    }
}

impl StatementApi for MockStatement {
    fn number_of_parameters(&self) -> Result<i16, Error> {
        Ok(self.number_of_parameters)
    }

    fn number_of_columns(&self) -> Result<i16, Error> {
        Ok(self.number_of_columns)
    }

    fn describe_parameter(&self, parameter_number: u16) -> Result<ColumnDescription, Error> {
        self.parameter_descriptions[(parameter_number - 1) as usize]
            .clone()
            .map_err(|_| Error::Driver {
                record: None,
                function: "SQLDescribeParam",
            })
    }

    fn describe_column(&self, column_number: u16) -> Result<ColumnDescription, Error> {
        self.column_descriptions[(column_number - 1) as usize]
            .clone()
            .map_err(|_| Error::Driver {
                record: None,
                function: "SQLDescribeColW",
            })
    }

    unsafe fn bind_input_parameter(
        &self,
        parameter_number: u16,
        c_type: CDataType,
        sql_type: SqlDataType,
        column_size: usize,
        decimal_digits: i16,
        _value_ptr: Pointer,
        _buffer_length: Len,
        _indicator: *mut Len,
    ) -> Result<(), Error> {
        self.bind_calls.borrow_mut().push(BindCall::Parameter {
            parameter_number,
            c_type,
            sql_type,
            column_size,
            decimal_digits,
        });
        Ok(())
    }

    unsafe fn bind_col(
        &self,
        column_number: u16,
        target_type: CDataType,
        _value_ptr: Pointer,
        _buffer_length: Len,
        _indicator: *mut Len,
    ) -> Result<(), Error> {
        self.bind_calls
            .borrow_mut()
            .push(BindCall::Column { column_number, target_type });
        Ok(())
    }

    fn set_row_array_size(&self, size: usize) -> Result<(), Error> {
        self.row_array_size.set(size);
        Ok(())
    }

    fn set_param_set_size(&self, size: usize) -> Result<(), Error> {
        self.param_set_size.set(size);
        Ok(())
    }

    unsafe fn set_rows_fetched_ptr(&self, ptr: *mut usize) -> Result<(), Error> {
        self.rows_fetched_ptr.set(Some(RawPtr(ptr)));
        Ok(())
    }

    unsafe fn set_params_processed_ptr(&self, ptr: *mut usize) -> Result<(), Error> {
        self.params_processed_ptr.set(Some(RawPtr(ptr)));
        Ok(())
    }

    fn execute_prepared(&self) -> Result<bool, Error> {
        self.execute_calls.set(self.execute_calls.get() + 1);
        let confirmed = self.confirm_override.get().unwrap_or(self.param_set_size.get());
        if let Some(RawPtr(ptr)) = self.params_processed_ptr.get() {
            unsafe { *ptr = confirmed };
        }
        Ok(true)
    }

    fn fetch_next_batch(&self) -> Result<bool, Error> {
        match self.fetch_batches.borrow_mut().pop_front() {
            Some(rows) => {
                if let Some(RawPtr(ptr)) = self.rows_fetched_ptr.get() {
                    unsafe { *ptr = rows };
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
