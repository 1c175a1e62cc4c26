use thiserror::Error as ThisError;

use crate::handles::{log_diagnostics, AsHandle, Record as DiagnosticRecord, SqlResult};

/// Error type returned by every fallible operation in this crate.
///
/// Variants follow the taxonomy a CLI-wrapping engine needs: errors that originate in
/// the driver and carry a diagnostic record, and a handful of caller-contract
/// violations that never reach the driver at all.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A call into the native CLI returned an error, or a success-with-info the caller
    /// asked to see. `record` is `None` only for a transport-level failure while
    /// fetching the diagnostic record itself (e.g. allocating the very first
    /// environment handle, which has no parent to query).
    #[error("{}", format_driver_error(.record))]
    Driver {
        record: Option<DiagnosticRecord>,
        function: &'static str,
    },
    /// `make_description` encountered a CLI type code it does not know how to map.
    #[error("Unsupported column or parameter type: SQL data type code {sql_type}.")]
    UnsupportedType { sql_type: i16 },
    /// A buffer dimension was non-positive, or a value's runtime type could not be
    /// converted into a bound parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The caller violated a contract of this crate (e.g. asked to execute a batch
    /// larger than the buffered row count, or supplied the wrong number of values for
    /// a row).
    #[error("Logic error: {0}")]
    LogicError(String),
    /// A user-visible misuse distinct from a driver error, e.g. a parameter count
    /// mismatch surfaced by a caller-supplied adapter.
    #[error("Interface error: {0}")]
    InterfaceError(String),
}

fn format_driver_error(record: &Option<DiagnosticRecord>) -> String {
    match record {
        Some(record) => format!(
            "ODBC error\nstate: {}\nnative error code: {}\nmessage: {}",
            record.state.as_str(),
            record.native_error,
            record.message
        ),
        None => "ODBC error\n(no diagnostic record available)".to_owned(),
    }
}

// Defined here, rather than in the `handles` module, so that `handles` stays entirely
// agnostic of the concrete error type used above it.
impl<T> SqlResult<T> {
    /// Turns a raw CLI return code classification into a [`Result`], pulling a
    /// diagnostic record from `handle` in the error and warning cases.
    ///
    /// Panics if `self` is [`SqlResult::NoData`] -- callers that can observe `NO_DATA`
    /// as a meaningful outcome must use [`SqlResult::into_opt_result`] instead.
    pub fn into_result(self, handle: &dyn AsHandle, function: &'static str) -> Result<T, Error> {
        match self {
            SqlResult::Success(value) => Ok(value),
            SqlResult::SuccessWithInfo(value) => {
                log_diagnostics(handle);
                Ok(value)
            }
            SqlResult::Error => Err(driver_error(handle, function)),
            SqlResult::NoData => {
                panic!("Unexpected SQL_NO_DATA returned from '{function}'.")
            }
        }
    }

    /// Like [`SqlResult::into_result`], but a `NO_DATA` classification becomes
    /// `Ok(None)` rather than a panic -- used by calls (`fetch_scroll`, `execute`,
    /// `more_results`) for which "no more data" is a normal outcome.
    pub fn into_opt_result(
        self,
        handle: &dyn AsHandle,
        function: &'static str,
    ) -> Result<Option<T>, Error> {
        match self {
            SqlResult::Success(value) => Ok(Some(value)),
            SqlResult::SuccessWithInfo(value) => {
                log_diagnostics(handle);
                Ok(Some(value))
            }
            SqlResult::NoData => Ok(None),
            SqlResult::Error => Err(driver_error(handle, function)),
        }
    }
}

fn driver_error(handle: &dyn AsHandle, function: &'static str) -> Error {
    let record = DiagnosticRecord::from_handle(handle, 1);
    if record.is_some() {
        log_diagnostics(handle);
    }
    Error::Driver { record, function }
}
