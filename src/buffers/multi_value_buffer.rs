use odbc_sys::{Len, NULL_DATA};

use crate::Error;

/// Indicator value the native CLI uses to mark an absent (`NULL`) element.
pub const NULL_SENTINEL: Len = NULL_DATA;

/// A column-oriented, fixed-layout batch buffer: `capacity` elements of `element_size`
/// bytes each, laid out contiguously, with a parallel array of per-element length/null
/// indicators.
///
/// Element *i* occupies `data[i*element_size .. (i+1)*element_size]`; `indicators[i]`
/// is either [`NULL_SENTINEL`] or the number of bytes written.
pub struct MultiValueBuffer {
    element_size: usize,
    capacity: usize,
    data: Vec<u8>,
    indicators: Vec<Len>,
}

impl MultiValueBuffer {
    pub fn new(element_size: usize, capacity: usize) -> Result<Self, Error> {
        if element_size == 0 || capacity == 0 {
            return Err(Error::InvalidArgument(format!(
                "MultiValueBuffer requires element_size >= 1 and capacity >= 1, got ({element_size}, {capacity})"
            )));
        }
        Ok(MultiValueBuffer {
            element_size,
            capacity,
            data: vec![0u8; element_size * capacity],
            indicators: vec![0; capacity],
        })
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn data_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn data_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    pub fn indicators_ptr(&mut self) -> *mut Len {
        self.indicators.as_mut_ptr()
    }

    fn bounds(&self, i: usize) -> std::ops::Range<usize> {
        let start = i * self.element_size;
        start..start + self.element_size
    }

    pub fn element(&self, i: usize) -> &[u8] {
        &self.data[self.bounds(i)]
    }

    pub fn element_mut(&mut self, i: usize) -> &mut [u8] {
        let range = self.bounds(i);
        &mut self.data[range]
    }

    pub fn element_ptr(&self, i: usize) -> *const u8 {
        self.element(i).as_ptr()
    }

    pub fn element_mut_ptr(&mut self, i: usize) -> *mut u8 {
        self.element_mut(i).as_mut_ptr()
    }

    pub fn indicator(&self, i: usize) -> Len {
        self.indicators[i]
    }

    pub fn set_indicator(&mut self, i: usize, value: Len) {
        self.indicators[i] = value;
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.indicators[i] == NULL_SENTINEL
    }
}

/// Copies `buf[i]`'s payload bytes and indicator into `buf[0]`.
///
/// Used when a rebind forces the parameter engine to discard every row but the one
/// currently being assembled, preserving it by relocating it to the head of the fresh
/// buffer's predecessor before the swap.
pub fn move_to_top(buf: &mut MultiValueBuffer, i: usize) {
    if i == 0 {
        return;
    }
    let element_size = buf.element_size;
    let src = i * element_size;
    buf.data.copy_within(src..src + element_size, 0);
    buf.indicators[0] = buf.indicators[i];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_element_size() {
        assert!(matches!(
            MultiValueBuffer::new(0, 10),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            MultiValueBuffer::new(8, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn element_bounds_are_contiguous_and_non_overlapping() {
        let mut buf = MultiValueBuffer::new(4, 3).unwrap();
        buf.element_mut(0).copy_from_slice(&[1, 2, 3, 4]);
        buf.element_mut(1).copy_from_slice(&[5, 6, 7, 8]);
        buf.element_mut(2).copy_from_slice(&[9, 10, 11, 12]);
        assert_eq!(buf.element(0), &[1, 2, 3, 4]);
        assert_eq!(buf.element(1), &[5, 6, 7, 8]);
        assert_eq!(buf.element(2), &[9, 10, 11, 12]);
    }

    #[test]
    fn null_sentinel_round_trips() {
        let mut buf = MultiValueBuffer::new(8, 2).unwrap();
        buf.set_indicator(0, NULL_SENTINEL);
        assert!(buf.is_null(0));
        buf.set_indicator(1, 4);
        assert!(!buf.is_null(1));
    }

    #[test]
    fn move_to_top_relocates_payload_and_indicator() {
        let mut buf = MultiValueBuffer::new(4, 3).unwrap();
        buf.element_mut(2).copy_from_slice(&[9, 9, 9, 9]);
        buf.set_indicator(2, 4);
        move_to_top(&mut buf, 2);
        assert_eq!(buf.element(0), &[9, 9, 9, 9]);
        assert_eq!(buf.indicator(0), 4);
    }

    #[test]
    fn move_to_top_of_zero_is_a_no_op() {
        let mut buf = MultiValueBuffer::new(4, 3).unwrap();
        buf.element_mut(0).copy_from_slice(&[1, 2, 3, 4]);
        buf.set_indicator(0, 4);
        move_to_top(&mut buf, 0);
        assert_eq!(buf.element(0), &[1, 2, 3, 4]);
        assert_eq!(buf.indicator(0), 4);
    }
}
