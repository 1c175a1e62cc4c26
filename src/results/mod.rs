//! The result-set engine: column-oriented batch buffers fetched from a statement's
//! result columns, single- or double-buffered.

mod bound_result_set;
mod buffer_size;
mod double_buffered_result_set;

pub use bound_result_set::{BoundResultSet, Column};
pub use buffer_size::{determine_rows_to_buffer, halve_buffer_size, BufferSize};
pub use double_buffered_result_set::DoubleBufferedResultSet;
