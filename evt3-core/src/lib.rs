//! EVT 3.0 decoder library for Prophesee event cameras.
//!
//! This crate decodes the EVT 3.0 raw data format into columnar arrays of CD
//! (Change Detection) events and external trigger events.
//!
//! # Example
//!
//! ```no_run
//! use evt3_core::{decode_from_path, DEFAULT_SENSOR_HEIGHT, DEFAULT_SENSOR_WIDTH};
//!
//! let events = decode_from_path("recording.raw", DEFAULT_SENSOR_WIDTH, DEFAULT_SENSOR_HEIGHT)?;
//!
//! println!("{}", events);
//! println!("first timestamp: {:?}", events.t().first());
//! # Ok::<(), evt3_core::DecodeError>(())
//! ```
//!
//! # Features
//!
//! - Full EVT 3.0 word set including vectorized events
//! - Wraparound-corrected 64-bit timestamps
//! - Columnar output with amortized growth and allocation-failure reporting
//! - Strict decoding by default, lenient mode on request
//! - File header parsing for sensor metadata
//! - CSV and binary writers with customizable field ordering

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod header;
pub mod output;
pub mod parser;
pub mod result;
pub mod timestamp;
pub mod types;
pub mod vector;
pub mod words;

use std::path::Path;

// Re-export commonly used types
pub use config::{DecoderConfig, TimeSync, UnknownWordPolicy};
pub use decoder::{DecodeError, DecodeStats, Evt3Decoder};
pub use output::{FieldOrder, OutputError};
pub use result::{Column, DecodeResult, TriggerResult};
pub use types::{
    CdEvent, SensorMetadata, TriggerEvent, WordKind, DEFAULT_SENSOR_HEIGHT, DEFAULT_SENSOR_WIDTH,
};
pub use words::WordStream;

/// Decodes an in-memory buffer of EVT 3.0 words into CD events.
///
/// `sensor_width` and `sensor_height` are attached to the result as given.
pub fn decode(
    bytes: &[u8],
    sensor_width: u32,
    sensor_height: u32,
) -> Result<DecodeResult, DecodeError> {
    decode_with_triggers(bytes, sensor_width, sensor_height).map(|(events, _)| events)
}

/// Decodes an in-memory buffer into CD events and trigger events.
pub fn decode_with_triggers(
    bytes: &[u8],
    sensor_width: u32,
    sensor_height: u32,
) -> Result<(DecodeResult, TriggerResult), DecodeError> {
    Evt3Decoder::with_config(DecoderConfig::for_sensor(sensor_width, sensor_height))
        .decode_bytes(bytes)
}

/// Reads and decodes a recording into CD events.
///
/// A `%` file header, if present, is skipped, and so are the words before the
/// first TIME_HIGH of such a headed recording. The result carries the given
/// geometry. A path that cannot be read fails with [`DecodeError::Io`].
pub fn decode_from_path<P: AsRef<Path>>(
    path: P,
    sensor_width: u32,
    sensor_height: u32,
) -> Result<DecodeResult, DecodeError> {
    decode_file_with_triggers(path, sensor_width, sensor_height).map(|(events, _)| events)
}

/// Reads and decodes a recording into CD events and trigger events.
pub fn decode_file_with_triggers<P: AsRef<Path>>(
    path: P,
    sensor_width: u32,
    sensor_height: u32,
) -> Result<(DecodeResult, TriggerResult), DecodeError> {
    Evt3Decoder::with_config(DecoderConfig::for_sensor(sensor_width, sensor_height))
        .decode_file_as_configured(path)
}
