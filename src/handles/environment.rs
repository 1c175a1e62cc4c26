use std::{ptr::null_mut, sync::Arc};

use odbc_sys::{AttrOdbcVersion, EnvironmentAttribute, Handle, HandleType, SQLAllocHandle, SQLSetEnvAttr, SqlReturn};
use widestring::U16String;

use crate::{Error, Options};

use super::{as_handle::AsHandle, connection::Connection, drop_handle, sql_result::SqlResult};

/// An allocated ODBC environment handle.
///
/// The very first handle in the parent chain: a [`crate::Connection`] keeps its
/// `Environment` alive through a shared, strong reference (see
/// [`Environment::make_connection`]).
pub struct Environment {
    handle: Handle,
}

// An environment handle is only ever touched by the thread that holds the `Environment`
// (or a connection/statement descending from it). Handing the whole tree to another
// thread -- as `DoubleBufferedResultSet`'s reader does with a `Statement` -- never
// races with the originating thread, which parts with its reference for the duration.
unsafe impl Send for Environment {}
unsafe impl Sync for Environment {}

impl AsHandle for Environment {
    fn as_handle(&self) -> Handle {
        self.handle
    }

    fn handle_type(&self) -> HandleType {
        HandleType::Env
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        drop_handle(self.handle, HandleType::Env);
    }
}

impl Environment {
    /// Allocates a new environment handle and declares ODBC version 3.
    pub fn new() -> Result<Self, Error> {
        let mut handle: Handle = null_mut();
        let ret = unsafe { SQLAllocHandle(HandleType::Env, null_mut(), &mut handle) };
        // Allocating the very first handle has no parent handle to pull a diagnostic
        // record from, so a SUCCESS_WITH_INFO here is treated exactly like SUCCESS:
        // whatever info the driver manager left behind is unreachable. This mirrors
        // the source this design is adapted from, which skips the query for the same
        // reason (see DESIGN.md, "open question" resolutions).
        match ret {
            SqlReturn::SUCCESS | SqlReturn::SUCCESS_WITH_INFO => {}
            _ => {
                return Err(Error::Driver {
                    record: None,
                    function: "SQLAllocHandle(ENV)",
                })
            }
        }
        let environment = Environment { handle };
        environment.declare_version(AttrOdbcVersion::Odbc3_80)?;
        Ok(environment)
    }

    fn declare_version(&self, version: AttrOdbcVersion) -> Result<(), Error> {
        let ret = unsafe {
            SQLSetEnvAttr(
                self.handle,
                EnvironmentAttribute::OdbcVersion,
                version as usize as *mut _,
                0,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLSetEnvAttr")
    }

    /// Establishes a connection to `connection_string` under this environment.
    pub fn make_connection(
        self: &Arc<Self>,
        connection_string: &str,
        options: &Options,
    ) -> Result<Connection, Error> {
        let wide = U16String::from_str(connection_string);
        Connection::new(Arc::clone(self), &wide, options)
    }
}
