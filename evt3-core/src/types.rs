//! Core types for EVT 3.0 event data.
//!
//! This module defines the row views of decoded events and the closed set of
//! raw word kinds defined by the EVT 3.0 format.

/// Default sensor width for the Gen4 / IMX636 family.
pub const DEFAULT_SENSOR_WIDTH: u32 = 1280;

/// Default sensor height for the Gen4 / IMX636 family.
pub const DEFAULT_SENSOR_HEIGHT: u32 = 720;

/// A decoded Change Detection (CD) event.
///
/// CD events represent brightness changes detected by the event camera sensor.
/// Decoded events are stored column-wise in [`crate::DecodeResult`]; this
/// struct is the row view handed out by its accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CdEvent {
    /// X coordinate of the pixel
    pub x: u16,
    /// Y coordinate of the pixel
    pub y: u16,
    /// Event polarity: 0 = OFF (decrease), 1 = ON (increase in brightness)
    pub polarity: u8,
    /// Timestamp in sensor ticks (microseconds)
    pub timestamp: u64,
}

impl CdEvent {
    /// Creates a new CD event.
    #[inline]
    pub fn new(x: u16, y: u16, polarity: u8, timestamp: u64) -> Self {
        Self {
            x,
            y,
            polarity,
            timestamp,
        }
    }
}

/// An external trigger event.
///
/// Trigger events indicate that an edge (change of electrical state) was
/// detected on an external trigger signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TriggerEvent {
    /// Trigger channel ID
    pub channel: u8,
    /// Edge polarity: 0 = falling edge, 1 = rising edge
    pub polarity: u8,
    /// Timestamp in sensor ticks (microseconds)
    pub timestamp: u64,
}

impl TriggerEvent {
    /// Creates a new trigger event.
    #[inline]
    pub fn new(channel: u8, polarity: u8, timestamp: u64) -> Self {
        Self {
            channel,
            polarity,
            timestamp,
        }
    }
}

/// EVT 3.0 word kinds.
///
/// Each 16-bit word carries a 4-bit type field in its most significant bits.
/// Every one of the 16 possible values maps to a variant; values the format
/// leaves unassigned resolve to [`WordKind::Reserved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Y coordinate and system type (0x0)
    AddrY,
    /// Single valid event with X coordinate and polarity (0x2)
    AddrX,
    /// Base X coordinate for subsequent vector events (0x3)
    VectBaseX,
    /// Vector event with 12 validity bits (0x4)
    Vect12,
    /// Vector event with 8 validity bits (0x5)
    Vect8,
    /// Lower 12 bits of timestamp (0x6)
    TimeLow,
    /// Continued event with 4 bits of data (0x7)
    Continued4,
    /// Upper 12 bits of timestamp (0x8)
    TimeHigh,
    /// External trigger event (0xA)
    ExtTrigger,
    /// Extension event type (0xE)
    Others,
    /// Continued event with 12 bits of data (0xF)
    Continued12,
    /// Unassigned type nibble (0x1, 0x9, 0xB, 0xC, 0xD)
    Reserved(u8),
}

impl WordKind {
    /// Resolves a 4-bit type value. Only the low nibble of `value` is used.
    #[inline]
    pub fn from_nibble(value: u8) -> Self {
        match value & 0xF {
            0x0 => Self::AddrY,
            0x2 => Self::AddrX,
            0x3 => Self::VectBaseX,
            0x4 => Self::Vect12,
            0x5 => Self::Vect8,
            0x6 => Self::TimeLow,
            0x7 => Self::Continued4,
            0x8 => Self::TimeHigh,
            0xA => Self::ExtTrigger,
            0xE => Self::Others,
            0xF => Self::Continued12,
            other => Self::Reserved(other),
        }
    }

    /// Returns the 4-bit type value of this kind.
    pub fn nibble(self) -> u8 {
        match self {
            Self::AddrY => 0x0,
            Self::AddrX => 0x2,
            Self::VectBaseX => 0x3,
            Self::Vect12 => 0x4,
            Self::Vect8 => 0x5,
            Self::TimeLow => 0x6,
            Self::Continued4 => 0x7,
            Self::TimeHigh => 0x8,
            Self::ExtTrigger => 0xA,
            Self::Others => 0xE,
            Self::Continued12 => 0xF,
            Self::Reserved(n) => n,
        }
    }
}

/// Sensor geometry.
///
/// Supplied by the caller (or read from a recording's header); never derived
/// from the event words themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMetadata {
    /// Sensor width in pixels
    pub width: u32,
    /// Sensor height in pixels
    pub height: u32,
}

impl SensorMetadata {
    /// Creates metadata for a `width` x `height` sensor.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for SensorMetadata {
    fn default() -> Self {
        // Default to Gen4 sensor geometry (1280x720)
        Self {
            width: DEFAULT_SENSOR_WIDTH,
            height: DEFAULT_SENSOR_HEIGHT,
        }
    }
}
