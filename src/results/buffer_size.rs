/// The policy used to size a result set's row-array buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferSize {
    /// A fixed number of rows per batch.
    Rows(usize),
    /// A target memory budget per batch, in megabytes; the number of rows is derived
    /// from the total per-row element size.
    Megabytes(usize),
}

/// Resolves `buffer_size` into a concrete row count given the sum of per-column
/// element sizes, always at least one row.
pub fn determine_rows_to_buffer(buffer_size: BufferSize, total_element_size: usize) -> usize {
    match buffer_size {
        BufferSize::Rows(k) => k.max(1),
        BufferSize::Megabytes(m) => {
            let budget = m * (1 << 20);
            (budget / total_element_size.max(1)).max(1)
        }
    }
}

/// Halves a buffer size for double-buffering, rounding up -- applied to the
/// `BufferSize` value itself, before rows are determined, so each half independently
/// re-applies the "at least one row" floor.
pub fn halve_buffer_size(buffer_size: BufferSize) -> BufferSize {
    match buffer_size {
        BufferSize::Rows(k) => BufferSize::Rows((k + 1) / 2),
        BufferSize::Megabytes(m) => BufferSize::Megabytes((m + 1) / 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(BufferSize::Rows(0), 8, 1; "rows floors at one")]
    #[test_case(BufferSize::Rows(100), 8, 100; "rows passes through")]
    #[test_case(BufferSize::Megabytes(1), 1024, 1024; "megabytes divides by row size")]
    #[test_case(BufferSize::Megabytes(1), 1 << 21, 1; "megabytes floors at one")]
    fn resolves_rows(buffer_size: BufferSize, element_size: usize, expected: usize) {
        assert_eq!(determine_rows_to_buffer(buffer_size, element_size), expected);
    }

    #[test]
    fn halving_rounds_up() {
        assert_eq!(halve_buffer_size(BufferSize::Rows(5)), BufferSize::Rows(3));
        assert_eq!(halve_buffer_size(BufferSize::Rows(4)), BufferSize::Rows(2));
        assert_eq!(
            halve_buffer_size(BufferSize::Megabytes(5)),
            BufferSize::Megabytes(3)
        );
    }
}
