use odbc_sys::SqlReturn;

/// Classification of a raw `SQLRETURN`, generic over the success payload.
///
/// Every shim call in [`super::environment`], [`super::connection`], and
/// [`super::statement`] produces one of these; `crate::Error`'s `into_result`/
/// `into_opt_result` (defined in `crate::error`, not here, see the module docs) turn
/// it into a `Result`.
#[derive(Debug)]
pub enum SqlResult<T> {
    /// The call succeeded without remark.
    Success(T),
    /// The call succeeded; a diagnostic record is available and worth logging.
    SuccessWithInfo(T),
    /// The call reported "no more data" (end of result set, end of result sets, or
    /// similar). Only produced by calls where that is a meaningful outcome.
    NoData,
    /// The call failed; a diagnostic record should be pulled from the handle.
    Error,
}

impl<T> SqlResult<T> {
    /// Classifies `ret`, lazily computing the success payload only if the call
    /// actually succeeded (with or without info).
    pub fn new(ret: SqlReturn, value: impl FnOnce() -> T) -> Self {
        match ret {
            SqlReturn::SUCCESS => SqlResult::Success(value()),
            SqlReturn::SUCCESS_WITH_INFO => SqlResult::SuccessWithInfo(value()),
            SqlReturn::NO_DATA => SqlResult::NoData,
            _ => SqlResult::Error,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SqlResult<U> {
        match self {
            SqlResult::Success(v) => SqlResult::Success(f(v)),
            SqlResult::SuccessWithInfo(v) => SqlResult::SuccessWithInfo(f(v)),
            SqlResult::NoData => SqlResult::NoData,
            SqlResult::Error => SqlResult::Error,
        }
    }
}
