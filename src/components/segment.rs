//! Seven-segment BCD decoder.
//!
//! Segments are ordered a through g:
//!
//! ```text
//!  aaa
//! f   b
//!  ggg
//! e   c
//!  ddd
//! ```

use crate::circuit::LogicValue;

/// Lit segments (a..g) for the digits 0-9.
pub const SEGMENT_TABLE: [[bool; 7]; 10] = [
    [true, true, true, true, true, true, false],     // 0
    [false, true, true, false, false, false, false], // 1
    [true, true, false, true, true, false, true],    // 2
    [true, true, true, true, false, false, true],    // 3
    [false, true, true, false, false, true, true],   // 4
    [true, false, true, true, false, true, true],    // 5
    [true, false, true, true, true, true, true],     // 6
    [true, true, true, false, false, false, false],  // 7
    [true, true, true, true, true, true, true],      // 8
    [true, true, true, true, false, true, true],     // 9
];

/// Decode a 4-bit value (bit 0 first) into segment levels.
///
/// Any undefined bit makes every segment `Undefined`. Values 10-15 have no
/// table entry and turn every segment off.
pub fn decode_bcd(bits: [LogicValue; 4]) -> [LogicValue; 7] {
    if bits.iter().any(|b| !b.is_defined()) {
        return [LogicValue::Undefined; 7];
    }

    let value = bits
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_high())
        .fold(0usize, |acc, (i, _)| acc | (1 << i));

    let mut segments = [LogicValue::Low; 7];
    if let Some(lit) = SEGMENT_TABLE.get(value) {
        for (seg, on) in segments.iter_mut().zip(lit) {
            *seg = LogicValue::from_bool(*on);
        }
    }
    segments
}
