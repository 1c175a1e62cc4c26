use std::sync::Arc;

use odbc_sys::{Len, Pointer};

use crate::{
    buffers::{make_description, ColumnInfo, Description, MultiValueBuffer},
    handles::StatementApi,
    Error, Options,
};

use super::buffer_size::{determine_rows_to_buffer, BufferSize};

/// One result column: its resolved shape and the buffer it is fetched into.
pub struct Column {
    pub description: Description,
    pub buffer: MultiValueBuffer,
}

impl Column {
    fn bind<S: StatementApi + ?Sized>(&mut self, statement: &S, column_number: u16) -> Result<(), Error> {
        let buffer_length = self.buffer.element_size() as Len;
        let value_ptr = self.buffer.data_mut_ptr() as Pointer;
        let indicator = self.buffer.indicators_ptr();
        unsafe {
            statement.bind_col(
                column_number,
                self.description.c_type_code(),
                value_ptr,
                buffer_length,
                indicator,
            )
        }
    }
}

/// A prepared statement's result columns, fetched in row-array batches.
///
/// Describes every column once at construction, sizes the shared row array from
/// [`BufferSize`], and registers a heap-stable counter the driver writes the number of
/// rows actually fetched into.
pub struct BoundResultSet<S> {
    statement: Arc<S>,
    columns: Vec<Column>,
    column_infos: Vec<ColumnInfo>,
    rows_fetched: Box<usize>,
    rows_to_buffer: usize,
}

impl<S: StatementApi> BoundResultSet<S> {
    pub fn new(statement: Arc<S>, buffer_size: BufferSize, options: &Options) -> Result<Self, Error> {
        let count = statement.number_of_columns()?;
        let mut descriptions = Vec::with_capacity(count.max(0) as usize);
        for index in 1..=count {
            let described = statement.describe_column(index as u16)?;
            descriptions.push(make_description(&described, options)?);
        }

        let total_element_size: usize = descriptions.iter().map(Description::element_size).sum();
        let rows_to_buffer = determine_rows_to_buffer(buffer_size, total_element_size);

        statement.set_row_array_size(rows_to_buffer)?;

        let mut columns = Vec::with_capacity(descriptions.len());
        for (i, description) in descriptions.into_iter().enumerate() {
            let buffer = MultiValueBuffer::new(description.element_size(), rows_to_buffer)?;
            let mut column = Column { description, buffer };
            column.bind(statement.as_ref(), (i + 1) as u16)?;
            columns.push(column);
        }

        let column_infos = columns.iter().map(|c| ColumnInfo::from(&c.description)).collect();

        let mut rows_fetched = Box::new(0usize);
        unsafe {
            statement.set_rows_fetched_ptr(rows_fetched.as_mut() as *mut usize)?;
        }

        Ok(BoundResultSet {
            statement,
            columns,
            column_infos,
            rows_fetched,
            rows_to_buffer,
        })
    }

    /// Re-applies every column binding and the rows-fetched pointer registration.
    ///
    /// Never strictly necessary in this implementation -- the backing `Vec`/`Box`
    /// allocations never move once made -- but kept so the sequence of CLI calls this
    /// type issues matches a fresh [`Self::new`] call, in case a driver relies on
    /// bindings being reasserted after handing the statement to another thread.
    pub fn rebind(&mut self) -> Result<(), Error> {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.bind(self.statement.as_ref(), (i + 1) as u16)?;
        }
        unsafe {
            self.statement
                .set_rows_fetched_ptr(self.rows_fetched.as_mut() as *mut usize)?;
        }
        Ok(())
    }

    pub fn rows_to_buffer(&self) -> usize {
        self.rows_to_buffer
    }

    pub fn column_infos(&self) -> &[ColumnInfo] {
        &self.column_infos
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Fetches the next row array. Returns the number of rows actually fetched, which
    /// is zero (not an error) once the CLI reports `SQL_NO_DATA`.
    pub fn fetch_next_batch(&mut self) -> Result<usize, Error> {
        let got_data = self.statement.fetch_next_batch()?;
        if !got_data {
            return Ok(0);
        }
        Ok(*self.rows_fetched)
    }
}
