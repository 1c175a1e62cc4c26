//! Owning wrappers around the three ODBC handle kinds, plus the shim calls and
//! diagnostic extraction the rest of the crate is built on.
//!
//! This module is deliberately agnostic of [`crate::Error`] -- it only speaks
//! [`SqlResult`], a generic success/warning/error/no-data classification of a raw
//! `SQLRETURN`. The conversion into the crate's concrete error type lives next to
//! `Error` itself (`crate::error`), not here.

mod as_handle;
mod connection;
mod diagnostics;
mod environment;
mod sql_result;
mod statement;
mod statement_api;

pub use as_handle::AsHandle;
pub use connection::Connection;
pub use diagnostics::{log_diagnostics, Record, State};
pub use environment::Environment;
pub use sql_result::SqlResult;
pub use statement::{ColumnDescription, Statement};
pub use statement_api::StatementApi;

use odbc_sys::{Handle, HandleType, SQLFreeHandle};

/// Frees a raw handle, logging (never propagating) any failure.
///
/// Every owning wrapper in this module calls this from its `Drop` impl. A destructor
/// cannot meaningfully report failure to its caller, so a failed `SQLFreeHandle` is
/// logged at `error` level and otherwise ignored -- mirroring the propagation policy
/// for every other resource-release path in this crate.
fn drop_handle(handle: Handle, handle_type: HandleType) {
    let ret = unsafe { SQLFreeHandle(handle_type, handle) };
    if !ret.is_success() {
        log::error!("Freeing ODBC handle of type {handle_type:?} failed with {ret:?}.");
    }
}

trait SqlReturnExt {
    fn is_success(self) -> bool;
}

impl SqlReturnExt for odbc_sys::SqlReturn {
    fn is_success(self) -> bool {
        matches!(
            self,
            odbc_sys::SqlReturn::SUCCESS | odbc_sys::SqlReturn::SUCCESS_WITH_INFO
        )
    }
}
