use std::fmt;

use odbc_sys::{SQLGetDiagRecW, SqlReturn, SQLSTATE_SIZE};

use super::as_handle::AsHandle;

/// A five-character ASCII SQLSTATE-like status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State(pub [u8; SQLSTATE_SIZE]);

impl State {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("?????")
    }

    fn from_wide(code: &[u16; SQLSTATE_SIZE]) -> Self {
        let mut ascii = [0u8; SQLSTATE_SIZE];
        for (dst, src) in ascii.iter_mut().zip(code.iter()) {
            *dst = *src as u8;
        }
        State(ascii)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic record as returned by `SQLGetDiagRec`: a five-character status code,
/// the driver's native error code, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub state: State,
    pub native_error: i32,
    pub message: String,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "state: {}, native error: {}, message: {}",
            self.state, self.native_error, self.message
        )
    }
}

/// Initial buffer length (in UTF-16 code units) tried for a diagnostic message before
/// falling back to an exact-size retry if the driver reports truncation.
const INITIAL_MESSAGE_BUFFER_LEN: usize = 512;

impl Record {
    /// Retrieves diagnostic record number `rec_number` (1-based) from `handle`, or
    /// `None` if the driver has nothing to report at that index.
    pub fn from_handle(handle: &dyn AsHandle, rec_number: i16) -> Option<Record> {
        let mut buffer = vec![0u16; INITIAL_MESSAGE_BUFFER_LEN];
        let (ret, mut state, native_error, text_length) =
            Self::call(handle, rec_number, &mut buffer);
        if ret == SqlReturn::NO_DATA {
            return None;
        }
        if ret == SqlReturn::SUCCESS_WITH_INFO && (text_length as usize) >= buffer.len() {
            // Message got truncated. Regrow to the exact size the driver reported and
            // retry once.
            buffer = vec![0u16; text_length as usize + 1];
            let (ret2, state2, native_error2, _) = Self::call(handle, rec_number, &mut buffer);
            if ret2 == SqlReturn::NO_DATA {
                return None;
            }
            state = state2;
            return Some(Record {
                state,
                native_error: native_error2,
                message: widestring::U16Str::from_slice(&buffer)
                    .to_string_lossy()
                    .trim_end_matches('\0')
                    .to_owned(),
            });
        }
        Some(Record {
            state,
            native_error,
            message: widestring::U16Str::from_slice(&buffer)
                .to_string_lossy()
                .trim_end_matches('\0')
                .to_owned(),
        })
    }

    fn call(
        handle: &dyn AsHandle,
        rec_number: i16,
        message_buffer: &mut [u16],
    ) -> (SqlReturn, State, i32, i16) {
        let mut state_buffer = [0u16; SQLSTATE_SIZE];
        let mut native_error: i32 = 0;
        let mut text_length: i16 = 0;
        let ret = unsafe {
            SQLGetDiagRecW(
                handle.handle_type(),
                handle.as_handle(),
                rec_number,
                state_buffer.as_mut_ptr(),
                &mut native_error,
                message_buffer.as_mut_ptr(),
                message_buffer.len() as i16,
                &mut text_length,
            )
        };
        (ret, State::from_wide(&state_buffer), native_error, text_length)
    }
}

/// Logs every diagnostic record currently available on `handle` at `debug` level.
///
/// Called whenever a CLI call returns `SUCCESS_WITH_INFO`: the call itself succeeded,
/// but the driver left something worth seeing in the diagnostic queue.
pub fn log_diagnostics(handle: &dyn AsHandle) {
    let mut rec_number = 1;
    while let Some(record) = Record::from_handle(handle, rec_number) {
        log::debug!("ODBC diagnostic record: {record}");
        rec_number += 1;
    }
}
