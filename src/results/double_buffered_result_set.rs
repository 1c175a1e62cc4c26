use std::{
    sync::mpsc::{sync_channel, Receiver, SyncSender},
    thread::{self, JoinHandle},
};

use odbc_sys::{Len, Pointer};

use crate::{
    buffers::{make_description, ColumnInfo, Description, MultiValueBuffer},
    handles::StatementApi,
    Error, Options,
};

use super::buffer_size::{determine_rows_to_buffer, halve_buffer_size, BufferSize};

enum Request {
    Fetch(Vec<MultiValueBuffer>),
    Stop,
}

type FetchResult = Result<(Vec<MultiValueBuffer>, usize), Error>;

fn bind_columns<S: StatementApi + ?Sized>(
    statement: &S,
    descriptions: &[Description],
    batch: &mut [MultiValueBuffer],
) -> Result<(), Error> {
    for (i, (description, buffer)) in descriptions.iter().zip(batch.iter_mut()).enumerate() {
        let buffer_length = buffer.element_size() as Len;
        let value_ptr = buffer.data_mut_ptr() as Pointer;
        let indicator = buffer.indicators_ptr();
        unsafe {
            statement.bind_col(
                (i + 1) as u16,
                description.c_type_code(),
                value_ptr,
                buffer_length,
                indicator,
            )?;
        }
    }
    Ok(())
}

/// Owns the statement for the lifetime of the background thread; never touched by the
/// foreground once moved in here, so `S` only needs to be `Send`, not `Sync`.
fn reader_loop<S: StatementApi>(
    statement: S,
    descriptions: Vec<Description>,
    request_rx: Receiver<Request>,
    response_tx: SyncSender<FetchResult>,
) {
    let mut rows_fetched = Box::new(0usize);
    if let Err(error) = unsafe { statement.set_rows_fetched_ptr(rows_fetched.as_mut() as *mut usize) } {
        let _ = response_tx.send(Err(error));
        return;
    }

    while let Ok(request) = request_rx.recv() {
        let mut batch = match request {
            Request::Stop => break,
            Request::Fetch(batch) => batch,
        };
        let result = bind_columns(&statement, &descriptions, &mut batch)
            .and_then(|_| statement.fetch_next_batch());
        let response = match result {
            Ok(true) => Ok((batch, *rows_fetched)),
            Ok(false) => Ok((batch, 0)),
            Err(error) => Err(error),
        };
        let failed = response.is_err();
        if response_tx.send(response).is_err() || failed {
            break;
        }
    }
}

/// A result set fetched by a dedicated background thread, so the application can
/// process one row-array batch while the next one is already being fetched.
///
/// Modeled after the "swap two buffers through a pair of bounded channels" strategy:
/// the statement itself is moved wholesale into the background thread at
/// construction and never touched by the foreground again -- only the column buffers
/// travel back and forth. Two are allocated (each sized to half of `buffer_size`) so
/// one can be read while the other is being filled.
pub struct DoubleBufferedResultSet {
    column_infos: Vec<ColumnInfo>,
    /// The most recently fetched batch, readable by the caller via [`Self::buffers`].
    /// `None` before the first [`Self::fetch_next_batch`] call, or after one failed.
    active: Option<Vec<MultiValueBuffer>>,
    /// The other batch, not yet handed to the reader thread. Only populated between
    /// construction and the first `fetch_next_batch` call.
    spare: Option<Vec<MultiValueBuffer>>,
    request_tx: SyncSender<Request>,
    response_rx: Receiver<FetchResult>,
    reader: Option<JoinHandle<()>>,
}

impl DoubleBufferedResultSet {
    pub fn new<S: StatementApi + 'static>(
        statement: S,
        buffer_size: BufferSize,
        options: &Options,
    ) -> Result<Self, Error> {
        let count = statement.number_of_columns()?;
        let mut descriptions = Vec::with_capacity(count.max(0) as usize);
        for index in 1..=count {
            let described = statement.describe_column(index as u16)?;
            descriptions.push(make_description(&described, options)?);
        }

        let total_element_size: usize = descriptions.iter().map(Description::element_size).sum();
        let half_rows = determine_rows_to_buffer(halve_buffer_size(buffer_size), total_element_size);
        statement.set_row_array_size(half_rows)?;

        let column_infos: Vec<ColumnInfo> = descriptions.iter().map(ColumnInfo::from).collect();

        let new_batch = |descriptions: &[Description]| -> Result<Vec<MultiValueBuffer>, Error> {
            descriptions
                .iter()
                .map(|d| MultiValueBuffer::new(d.element_size(), half_rows))
                .collect()
        };
        let buffer_a = new_batch(&descriptions)?;
        let buffer_b = new_batch(&descriptions)?;

        let (request_tx, request_rx) = sync_channel::<Request>(1);
        let (response_tx, response_rx) = sync_channel::<FetchResult>(1);

        let reader = thread::spawn(move || reader_loop(statement, descriptions, request_rx, response_tx));

        request_tx.send(Request::Fetch(buffer_a)).map_err(|_| {
            Error::LogicError("Background fetch thread terminated during startup.".to_owned())
        })?;

        Ok(DoubleBufferedResultSet {
            column_infos,
            active: None,
            spare: Some(buffer_b),
            request_tx,
            response_rx,
            reader: Some(reader),
        })
    }

    pub fn column_infos(&self) -> &[ColumnInfo] {
        &self.column_infos
    }

    /// The most recently fetched batch's column buffers, in column order.
    ///
    /// Panics before the first [`Self::fetch_next_batch`] call, or once a previous
    /// call has failed -- mirroring this crate's general stance that caller misuse
    /// after a reported error is not specified behavior.
    pub fn buffers(&self) -> &[MultiValueBuffer] {
        self.active
            .as_deref()
            .expect("DoubleBufferedResultSet::buffers called with no fetched batch available")
    }

    /// Fetches the next row array, returning the number of rows fetched -- zero once
    /// the result set is exhausted.
    ///
    /// Dispatches the batch the caller is done with to the background thread for
    /// prefetching before blocking on the one already (or about to be) filled, so the
    /// two stay overlapped across calls.
    pub fn fetch_next_batch(&mut self) -> Result<usize, Error> {
        if self.active.is_none() && self.spare.is_none() {
            return Err(Error::LogicError(
                "DoubleBufferedResultSet is unusable after a previous fetch failed.".to_owned(),
            ));
        }
        if let Some(free) = self.active.take().or_else(|| self.spare.take()) {
            self.request_tx.send(Request::Fetch(free)).map_err(|_| {
                Error::LogicError("Background fetch thread terminated.".to_owned())
            })?;
        }
        let (filled, rows) = self
            .response_rx
            .recv()
            .map_err(|_| Error::LogicError("Background fetch thread terminated.".to_owned()))??;
        self.active = Some(filled);
        Ok(rows)
    }
}

impl Drop for DoubleBufferedResultSet {
    fn drop(&mut self) {
        let _ = self.request_tx.send(Request::Stop);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                log::error!("Background fetch thread of a DoubleBufferedResultSet panicked.");
            }
        }
    }
}
