//! Encodes a [`Value`] into a parameter slot's buffer element, in the native CLI's
//! binary layout.

use widestring::U16String;

use crate::{buffers::MultiValueBuffer, buffers::NULL_SENTINEL, Value};

/// Marks row `row` of `buffer` as `NULL`. The payload bytes are left untouched -- the
/// driver is required to ignore them once the indicator says `NULL`.
pub(crate) fn write_null(buffer: &mut MultiValueBuffer, row: usize) {
    buffer.set_indicator(row, NULL_SENTINEL);
}

/// Writes `value`'s bytes into row `row` of `buffer` and sets the matching indicator.
///
/// The caller is responsible for ensuring `buffer`'s element already has enough room
/// for `value` (see [`crate::buffers::Description::is_suitable_for`]); this function
/// only ever writes within the slice `element_mut` hands back.
pub(crate) fn write_value(buffer: &mut MultiValueBuffer, row: usize, value: &Value) {
    match value {
        Value::Integer(v) => {
            buffer.element_mut(row).copy_from_slice(&v.to_ne_bytes());
            buffer.set_indicator(row, std::mem::size_of::<i64>() as isize);
        }
        Value::Float(v) => {
            buffer.element_mut(row).copy_from_slice(&v.to_ne_bytes());
            buffer.set_indicator(row, std::mem::size_of::<f64>() as isize);
        }
        Value::Boolean(v) => {
            buffer.element_mut(row)[0] = *v as u8;
            buffer.set_indicator(row, 1);
        }
        Value::Date(date) => {
            let element = buffer.element_mut(row);
            element[0..2].copy_from_slice(&date.year.to_ne_bytes());
            element[2..4].copy_from_slice(&date.month.to_ne_bytes());
            element[4..6].copy_from_slice(&date.day.to_ne_bytes());
            buffer.set_indicator(row, crate::buffers::DATE_STRUCT_SIZE as isize);
        }
        Value::Timestamp(ts) => {
            let element = buffer.element_mut(row);
            element[0..2].copy_from_slice(&ts.year.to_ne_bytes());
            element[2..4].copy_from_slice(&ts.month.to_ne_bytes());
            element[4..6].copy_from_slice(&ts.day.to_ne_bytes());
            element[6..8].copy_from_slice(&ts.hour.to_ne_bytes());
            element[8..10].copy_from_slice(&ts.minute.to_ne_bytes());
            element[10..12].copy_from_slice(&ts.second.to_ne_bytes());
            let fraction_nanoseconds = ts.microsecond * 1000;
            element[12..16].copy_from_slice(&fraction_nanoseconds.to_ne_bytes());
            buffer.set_indicator(row, crate::buffers::TIMESTAMP_STRUCT_SIZE as isize);
        }
        Value::NarrowString(s) => {
            let bytes = s.as_bytes();
            let element = buffer.element_mut(row);
            element[..bytes.len()].copy_from_slice(bytes);
            element[bytes.len()] = 0;
            buffer.set_indicator(row, bytes.len() as isize);
        }
        Value::WideString(s) => {
            let units = U16String::from_str(s);
            let units = units.as_slice();
            let element = buffer.element_mut(row);
            for (i, unit) in units.iter().enumerate() {
                element[2 * i..2 * i + 2].copy_from_slice(&unit.to_ne_bytes());
            }
            element[2 * units.len()..2 * units.len() + 2].copy_from_slice(&0u16.to_ne_bytes());
            buffer.set_indicator(row, (2 * units.len()) as isize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Date, Timestamp};

    #[test]
    fn writes_null_indicator_without_touching_payload() {
        let mut buffer = MultiValueBuffer::new(8, 2).unwrap();
        write_null(&mut buffer, 0);
        assert!(buffer.is_null(0));
    }

    #[test]
    fn encodes_integer_as_native_endian_i64() {
        let mut buffer = MultiValueBuffer::new(8, 1).unwrap();
        write_value(&mut buffer, 0, &Value::Integer(42));
        assert_eq!(buffer.element(0), &42i64.to_ne_bytes());
        assert_eq!(buffer.indicator(0), 8);
    }

    #[test]
    fn encodes_narrow_string_null_terminated_with_byte_length_indicator() {
        let mut buffer = MultiValueBuffer::new(6, 1).unwrap();
        write_value(&mut buffer, 0, &Value::NarrowString("abc".to_owned()));
        assert_eq!(&buffer.element(0)[..4], b"abc\0");
        assert_eq!(buffer.indicator(0), 3);
    }

    #[test]
    fn encodes_wide_string_as_utf16_with_terminator() {
        let mut buffer = MultiValueBuffer::new(8, 1).unwrap();
        write_value(&mut buffer, 0, &Value::WideString("ab".to_owned()));
        let element = buffer.element(0);
        assert_eq!(&element[0..2], &('a' as u16).to_ne_bytes());
        assert_eq!(&element[2..4], &('b' as u16).to_ne_bytes());
        assert_eq!(&element[4..6], &0u16.to_ne_bytes());
        assert_eq!(buffer.indicator(0), 4);
    }

    #[test]
    fn scales_timestamp_microseconds_into_nanosecond_fraction() {
        let mut buffer = MultiValueBuffer::new(16, 1).unwrap();
        write_value(
            &mut buffer,
            0,
            &Value::Timestamp(Timestamp {
                year: 2024,
                month: 1,
                day: 2,
                hour: 3,
                minute: 4,
                second: 5,
                microsecond: 6,
            }),
        );
        let element = buffer.element(0);
        let fraction = u32::from_ne_bytes(element[12..16].try_into().unwrap());
        assert_eq!(fraction, 6000);
        assert_eq!(buffer.indicator(0), 16);
    }

    #[test]
    fn encodes_date_fields_in_order() {
        let mut buffer = MultiValueBuffer::new(6, 1).unwrap();
        write_value(
            &mut buffer,
            0,
            &Value::Date(Date {
                year: 2024,
                month: 3,
                day: 4,
            }),
        );
        let element = buffer.element(0);
        assert_eq!(i16::from_ne_bytes(element[0..2].try_into().unwrap()), 2024);
        assert_eq!(u16::from_ne_bytes(element[2..4].try_into().unwrap()), 3);
        assert_eq!(u16::from_ne_bytes(element[4..6].try_into().unwrap()), 4);
    }
}
