//! Decoder configuration.
//!
//! A [`DecoderConfig`] is a plain value owned by one [`Evt3Decoder`]; there is
//! no global configuration state.
//!
//! ```
//! use evt3_core::{DecoderConfig, SensorMetadata};
//!
//! let config = DecoderConfig::default()
//!     .with_sensor(SensorMetadata::new(640, 480))
//!     .lenient()
//!     .with_capacity_hint(1 << 20);
//! assert_eq!(config.sensor.width, 640);
//! ```
//!
//! [`Evt3Decoder`]: crate::Evt3Decoder

use crate::types::SensorMetadata;

/// What to do with a word whose type nibble is not assigned by EVT 3.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownWordPolicy {
    /// Abort the decode with [`DecodeError::UnknownWordType`](crate::DecodeError::UnknownWordType).
    #[default]
    Fail,
    /// Skip the word and continue.
    Skip,
}

/// When to discard words preceding the first TIME_HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSync {
    /// Synchronize recordings that carry a `%` header, decode bare word
    /// buffers from their first word.
    #[default]
    Auto,
    /// Always wait for the first TIME_HIGH.
    Always,
    /// Decode every word.
    Never,
}

impl TimeSync {
    /// Whether a decode pass should wait for the first TIME_HIGH.
    pub fn applies(self, has_header: bool) -> bool {
        match self {
            Self::Auto => has_header,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Settings for one decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Geometry attached to every result.
    pub sensor: SensorMetadata,
    /// Handling of reserved type nibbles.
    pub unknown_words: UnknownWordPolicy,
    /// Discarding of words before the first TIME_HIGH.
    ///
    /// Captures can begin in the middle of a packet, where the leading words
    /// refer to state that was never transmitted.
    pub time_sync: TimeSync,
    /// Number of CD events to pre-allocate for.
    pub capacity_hint: Option<usize>,
}

impl DecoderConfig {
    /// Configuration for a `width` x `height` sensor with all other settings
    /// at their defaults.
    pub fn for_sensor(width: u32, height: u32) -> Self {
        Self::default().with_sensor(SensorMetadata::new(width, height))
    }

    /// Sets the geometry attached to results.
    pub fn with_sensor(mut self, sensor: SensorMetadata) -> Self {
        self.sensor = sensor;
        self
    }

    /// Skip reserved words instead of failing.
    pub fn lenient(mut self) -> Self {
        self.unknown_words = UnknownWordPolicy::Skip;
        self
    }

    /// Forces waiting for the first TIME_HIGH on (`true`) or off (`false`)
    /// for every input.
    pub fn sync_on_time_high(mut self, enabled: bool) -> Self {
        self.time_sync = if enabled {
            TimeSync::Always
        } else {
            TimeSync::Never
        };
        self
    }

    /// Pre-allocates room for `events` CD events before decoding.
    pub fn with_capacity_hint(mut self, events: usize) -> Self {
        self.capacity_hint = Some(events);
        self
    }
}
