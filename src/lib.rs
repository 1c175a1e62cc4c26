//! A column-oriented, batched parameter and result-set engine for ODBC.
//!
//! This crate sits between the raw ODBC C API (exposed through [`odbc-sys`]) and a
//! user-facing cursor/row/column API. It does not decode buffer bytes into domain
//! values (dates, strings, ...) itself -- see [`translator`] for the seam a row-based
//! consumer plugs into -- nor does it parse connection strings or load configuration
//! files. What it does provide:
//!
//! - [`handles`]: owning wrappers around the three ODBC handle kinds (environment,
//!   connection, statement) with guaranteed release and diagnostic-record extraction.
//! - [`buffers`]: [`buffers::MultiValueBuffer`], the fixed-element-size columnar buffer
//!   every bound parameter and result column is stored in, plus [`buffers::Description`]
//!   and the `make_description` mapping from native CLI type codes to it.
//! - [`parameters`]: [`parameters::BoundParameterSet`] and [`parameters::RowParameterLoader`],
//!   which accept heterogeneous rows of [`Value`]s and automatically rebind a parameter
//!   slot when a value no longer fits its buffer.
//! - [`results`]: [`results::BoundResultSet`] and [`results::DoubleBufferedResultSet`],
//!   which fetch rows in row-array batches, the latter overlapping fetching with
//!   consumption via a background reader thread.
//!
//! [`odbc-sys`]: https://docs.rs/odbc-sys

mod error;
mod options;
mod value;

#[cfg(test)]
mod test_support;

pub mod buffers;
pub mod handles;
pub mod parameters;
pub mod results;
pub mod translator;

pub use error::Error;
pub use options::Options;
pub use value::Value;

pub use handles::{Connection, Environment, Statement};

pub use odbc_sys as sys;
pub use widestring::{U16Str, U16String};
