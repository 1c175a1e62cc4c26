use std::{
    ptr::null_mut,
    sync::{Arc, Mutex, OnceLock},
};

use odbc_sys::{
    CompletionType, ConnectionAttribute, Handle, HandleType, InfoType, Len, Pointer,
    SQLAllocHandle, SQLDisconnect, SQLDriverConnectW, SQLEndTran, SQLGetFunctions, SQLGetInfoW,
    SQLSetConnectAttrW, SqlReturn, FunctionId,
};
use widestring::{U16Str, U16String};

use crate::{Error, Options};

use super::{
    as_handle::AsHandle, drop_handle, environment::Environment, sql_result::SqlResult,
    statement::Statement,
};

/// Process-wide lock guarding `establish_connection`/`disconnect`.
///
/// Many driver managers are not reentrant for these two specific calls; every other
/// ODBC call is already serialised per connection/statement by ordinary Rust ownership,
/// so this is the only global synchronisation point in the crate.
fn connect_disconnect_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// An allocated ODBC connection handle, established against a connection string.
///
/// Keeps its parent [`Environment`] alive through a shared, strong reference.
pub struct Connection {
    handle: Handle,
    #[allow(dead_code)]
    environment: Arc<Environment>,
}

unsafe impl Send for Connection {}
unsafe impl Sync for Connection {}

impl AsHandle for Connection {
    fn as_handle(&self) -> Handle {
        self.handle
    }

    fn handle_type(&self) -> HandleType {
        HandleType::Dbc
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // An implicit rollback on drop, errors logged and suppressed: a destructor
        // cannot meaningfully propagate failure.
        if let Err(e) = self.end_transaction(CompletionType::Rollback) {
            log::error!("Rollback on connection drop failed: {e}");
        }
        let _guard = connect_disconnect_lock().lock().unwrap_or_else(|p| p.into_inner());
        let ret = unsafe { SQLDisconnect(self.handle) };
        if !matches!(ret, SqlReturn::SUCCESS | SqlReturn::SUCCESS_WITH_INFO) {
            log::error!("SQLDisconnect failed on connection drop: {ret:?}");
        }
        drop_handle(self.handle, HandleType::Dbc);
    }
}

impl Connection {
    /// Allocates a connection handle under `environment`, establishes it against
    /// `connection_string`, and applies `options.autocommit`.
    ///
    /// Exposed as a free function taking an explicit parent reference (rather than a
    /// `self`-handing-out method on `Environment`) to avoid a self-referential handle
    /// pattern for a type that does not otherwise need one.
    pub fn new(
        environment: Arc<Environment>,
        connection_string: &U16Str,
        options: &Options,
    ) -> Result<Self, Error> {
        let mut handle: Handle = null_mut();
        let ret =
            unsafe { SQLAllocHandle(HandleType::Dbc, environment.as_handle(), &mut handle) };
        SqlResult::new(ret, || ())
            .into_result(environment.as_ref(), "SQLAllocHandle(DBC)")?;

        let connection = Connection { handle, environment };

        {
            let _guard = connect_disconnect_lock().lock().unwrap_or_else(|p| p.into_inner());
            let mut out_connection_string = [0u16; 1024];
            let mut out_len: i16 = 0;
            let ret = unsafe {
                SQLDriverConnectW(
                    connection.handle,
                    null_mut(),
                    connection_string.as_ptr(),
                    connection_string.len() as i16,
                    out_connection_string.as_mut_ptr(),
                    out_connection_string.len() as i16,
                    &mut out_len,
                    odbc_sys::DriverConnectOption::NoPrompt,
                )
            };
            SqlResult::new(ret, || ()).into_result(&connection, "SQLDriverConnectW")?;
        }

        connection.set_autocommit(options.autocommit)?;
        Ok(connection)
    }

    fn set_autocommit(&self, autocommit: bool) -> Result<(), Error> {
        let value: Len = if autocommit { 1 } else { 0 };
        let ret = unsafe {
            SQLSetConnectAttrW(
                self.handle,
                ConnectionAttribute::AutoCommit,
                value as Pointer,
                0,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLSetConnectAttrW")
    }

    /// Allocates a statement under this connection.
    pub fn allocate_statement(self: &Arc<Self>) -> Result<Handle, Error> {
        let mut handle: Handle = null_mut();
        let ret = unsafe { SQLAllocHandle(HandleType::Stmt, self.handle, &mut handle) };
        SqlResult::new(ret, || ()).into_result(self.as_ref(), "SQLAllocHandle(STMT)")?;
        Ok(handle)
    }

    /// Allocates a new statement bound to this connection.
    pub fn make_statement(self: &Arc<Self>) -> Result<Statement, Error> {
        Statement::new(Arc::clone(self))
    }

    pub fn commit(&self) -> Result<(), Error> {
        self.end_transaction(CompletionType::Commit)
    }

    pub fn rollback(&self) -> Result<(), Error> {
        self.end_transaction(CompletionType::Rollback)
    }

    fn end_transaction(&self, completion_type: CompletionType) -> Result<(), Error> {
        let ret = unsafe { SQLEndTran(HandleType::Dbc, self.handle, completion_type) };
        SqlResult::new(ret, || ()).into_result(self, "SQLEndTran")
    }

    pub fn supports_function(&self, function_id: FunctionId) -> Result<bool, Error> {
        let mut supported: u16 = 0;
        let ret = unsafe { SQLGetFunctions(self.handle, function_id, &mut supported) };
        SqlResult::new(ret, || supported != 0).into_result(self, "SQLGetFunctions")
    }

    pub fn get_string_info(&self, info_type: InfoType) -> Result<String, Error> {
        let mut buffer = vec![0u16; 256];
        let mut text_length: i16 = 0;
        let ret = unsafe {
            SQLGetInfoW(
                self.handle,
                info_type,
                buffer.as_mut_ptr().cast(),
                (buffer.len() * 2) as i16,
                &mut text_length,
            )
        };
        SqlResult::new(ret, || ()).into_result(self, "SQLGetInfoW")?;
        buffer.truncate((text_length as usize / 2).min(buffer.len()));
        Ok(U16Str::from_slice(&buffer).to_string_lossy())
    }

    pub fn get_integer_info(&self, info_type: InfoType) -> Result<u32, Error> {
        let mut value: u32 = 0;
        let ret = unsafe {
            SQLGetInfoW(
                self.handle,
                info_type,
                (&mut value as *mut u32).cast(),
                std::mem::size_of::<u32>() as i16,
                null_mut(),
            )
        };
        SqlResult::new(ret, || value).into_result(self, "SQLGetInfoW")
    }
}

/// Convenience used by callers constructing a connection string from a plain `&str`.
pub fn to_connection_string(s: &str) -> U16String {
    U16String::from_str(s)
}
