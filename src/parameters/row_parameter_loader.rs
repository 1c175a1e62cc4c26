use crate::{
    buffers::{make_description_for_type, move_to_top},
    handles::StatementApi,
    Error, Value,
};

use super::{
    bound_parameter_set::BoundParameterSet,
    encode::{write_null, write_value},
};

/// Accumulates heterogeneous rows into a [`BoundParameterSet`], rebinding a slot in
/// place the first time a value no longer fits its current buffer.
///
/// Buffers rows until [`Self::flush`] is called explicitly or the set's buffered
/// capacity is reached, at which point [`Self::add_row`] flushes automatically before
/// continuing.
pub struct RowParameterLoader<'a, S> {
    set: &'a mut BoundParameterSet<S>,
    current_row: usize,
}

impl<'a, S: StatementApi> RowParameterLoader<'a, S> {
    pub fn new(set: &'a mut BoundParameterSet<S>) -> Self {
        RowParameterLoader { set, current_row: 0 }
    }

    /// Writes one row of parameter values, rebinding any slot `values` no longer fits.
    ///
    /// `values.len()` must equal [`BoundParameterSet::number_of_parameters`].
    pub fn add_row(&mut self, values: &[Option<Value>]) -> Result<(), Error> {
        if values.len() != self.set.number_of_parameters() {
            return Err(Error::Driver {
                record: None,
                function: "RowParameterLoader::add_row",
            });
        }

        if self.current_row == self.set.buffered_sets() {
            self.flush()?;
        }

        let mut active_row = self.current_row;

        for (index, value) in values.iter().enumerate() {
            match value {
                None => write_null(self.set.buffer_mut(index), active_row),
                Some(value) => {
                    let suitable = self.set.parameters()[index]
                        .description
                        .is_suitable_for(value.type_code(), value.size_hint());
                    if !suitable {
                        // The in-progress row is about to be orphaned by a rebind: push
                        // every already-complete row out first, then relocate this
                        // row's already-written cells to the head of the fresh buffer.
                        self.set.execute_batch(active_row)?;
                        for column in 0..self.set.number_of_parameters() {
                            move_to_top(self.set.buffer_mut(column), active_row);
                        }
                        active_row = 0;
                        let kind = make_description_for_type(value.type_code(), value.size_hint());
                        self.set.rebind(index, kind)?;
                    }
                    write_value(self.set.buffer_mut(index), active_row, value);
                }
            }
        }

        self.current_row = active_row + 1;
        Ok(())
    }

    /// Executes the prepared statement against every row buffered so far.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.set.execute_batch(self.current_row)?;
        self.current_row = 0;
        Ok(())
    }
}
