//! The parameter-set engine: column-oriented batch buffers bound to a prepared
//! statement's input parameters, with automatic rebinding of a slot whose value no
//! longer fits.

mod bound_parameter_set;
mod encode;
mod row_parameter_loader;

pub use bound_parameter_set::{BoundParameter, BoundParameterSet};
pub use row_parameter_loader::RowParameterLoader;
