#![allow(clippy::unusual_byte_groupings)]
//! Bit-field accessors for EVT 3.0 words.
//!
//! Every word is `[15:12] type | [11:0] payload`; the functions below pull the
//! per-type fields out of the payload. They are pure and branch-free so the
//! dispatcher can inline them.

use crate::types::WordKind;

/// Extracts the 4-bit type nibble from a word.
#[inline]
pub fn type_nibble(word: u16) -> u8 {
    ((word >> 12) & 0xF) as u8
}

/// Resolves the kind of a word.
#[inline]
pub fn word_kind(word: u16) -> WordKind {
    WordKind::from_nibble(type_nibble(word))
}

/// Extracts the 12-bit payload from a word.
#[inline]
pub fn payload(word: u16) -> u16 {
    word & 0x0FFF
}

// ============================================================================
// EVT_ADDR_Y (type = 0x0)
// Bits: [15:12] type | [11] system_type | [10:0] y
// ============================================================================

/// Extracts the row address from an EVT_ADDR_Y word.
#[inline]
pub fn addr_y_row(word: u16) -> u16 {
    word & 0x07FF
}

/// Extracts the system type (master/slave camera) from an EVT_ADDR_Y word.
#[inline]
pub fn addr_y_system_type(word: u16) -> u8 {
    ((word >> 11) & 0x1) as u8
}

// ============================================================================
// EVT_ADDR_X (type = 0x2) and VECT_BASE_X (type = 0x3)
// Bits: [15:12] type | [11] polarity | [10:0] x
// ============================================================================

/// Extracts the column from an EVT_ADDR_X or VECT_BASE_X word.
#[inline]
pub fn column(word: u16) -> u16 {
    word & 0x07FF
}

/// Extracts the polarity bit from an EVT_ADDR_X or VECT_BASE_X word.
#[inline]
pub fn polarity(word: u16) -> u8 {
    ((word >> 11) & 0x1) as u8
}

// ============================================================================
// VECT_12 (type = 0x4)
// Bits: [15:12] type | [11:0] valid
// ============================================================================

/// Extracts the 12-bit validity mask from a VECT_12 word.
#[inline]
pub fn vect_12_mask(word: u16) -> u16 {
    word & 0x0FFF
}

// ============================================================================
// VECT_8 (type = 0x5)
// Bits: [15:12] type | [11:8] unused | [7:0] valid
// ============================================================================

/// Extracts the 8-bit validity mask from a VECT_8 word.
#[inline]
pub fn vect_8_mask(word: u16) -> u16 {
    word & 0x00FF
}

// ============================================================================
// EVT_TIME_LOW (type = 0x6) / EVT_TIME_HIGH (type = 0x8)
// Bits: [15:12] type | [11:0] time
// ============================================================================

/// Extracts the 12-bit time fragment from a TIME_LOW or TIME_HIGH word.
#[inline]
pub fn time_fragment(word: u16) -> u16 {
    word & 0x0FFF
}

// ============================================================================
// EXT_TRIGGER (type = 0xA)
// Bits: [15:12] type | [11:8] channel | [7:1] unused | [0] polarity
// ============================================================================

/// Extracts the trigger channel ID from an EXT_TRIGGER word.
#[inline]
pub fn trigger_channel(word: u16) -> u8 {
    ((word >> 8) & 0x0F) as u8
}

/// Extracts the edge polarity from an EXT_TRIGGER word.
#[inline]
pub fn trigger_polarity(word: u16) -> u8 {
    (word & 0x01) as u8
}

// ============================================================================
// CONTINUED_4 (type = 0x7) / CONTINUED_12 (type = 0xF)
// Bits: [15:12] type | [3:0] data   or   [11:0] data
// ============================================================================

/// Extracts the 4-bit data field from a CONTINUED_4 word.
#[inline]
pub fn continued_4_data(word: u16) -> u16 {
    word & 0x000F
}

/// Extracts the 12-bit data field from a CONTINUED_12 word.
#[inline]
pub fn continued_12_data(word: u16) -> u16 {
    word & 0x0FFF
}
