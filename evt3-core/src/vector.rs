//! Expansion of VECT_12 / VECT_8 validity masks into individual events.

use crate::buffer::EventColumns;
use crate::decoder::DecodeError;

/// Mask width of a VECT_12 word.
pub const VECT_12_WIDTH: u16 = 12;

/// Mask width of a VECT_8 word.
pub const VECT_8_WIDTH: u16 = 8;

/// Expands `mask` into one event per set bit.
///
/// Bit `i` (least significant first) produces an event at `base_x + i`; all
/// events share `y`, `polarity` and `timestamp`. Returns the base for the next
/// vector word, `base_x + width`, whether or not any bit was set.
#[inline]
pub fn expand(
    events: &mut EventColumns,
    mask: u16,
    width: u16,
    base_x: u16,
    y: u16,
    polarity: u8,
    timestamp: u64,
) -> Result<u16, DecodeError> {
    let mut valid = mask & ((1u16 << width) - 1);
    if valid != 0 {
        events.reserve(valid.count_ones() as usize)?;
        while valid != 0 {
            let offset = valid.trailing_zeros() as u16;
            events.push_reserved(base_x.wrapping_add(offset), y, polarity, timestamp);
            valid &= valid - 1;
        }
    }
    Ok(base_x.wrapping_add(width))
}
