//! Stateful EVT 3.0 decoder.
//!
//! This module implements the EVT 3.0 state machine: every word is routed on
//! its type nibble and either updates the decoder registers (row, vector base,
//! time fragments) or emits events using the current register values.

use crate::buffer::{EventColumns, TriggerColumns};
use crate::config::{DecoderConfig, UnknownWordPolicy};
use crate::header;
use crate::parser;
use crate::result::{DecodeResult, TriggerResult};
use crate::timestamp::TimestampReconstructor;
use crate::types::{SensorMetadata, WordKind};
use crate::vector::{self, VECT_12_WIDTH, VECT_8_WIDTH};
use crate::words::WordStream;
use log::{debug, trace, warn};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during EVT 3.0 decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Odd input length {len}: trailing byte cannot form a 16-bit word")]
    OddLength { len: usize },

    #[error("Unknown word type 0x{nibble:X} at word {position}")]
    UnknownWordType { nibble: u8, position: usize },

    #[error("Vector word at word {position} has no preceding VECT_BASE_X")]
    VectorWithoutBase { position: usize },

    #[error("Failed to allocate {requested} rows for column `{column}`")]
    Allocation {
        column: &'static str,
        requested: usize,
    },
}

impl DecodeError {
    /// Returns `true` for errors caused by the content of the input stream.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::OddLength { .. } | Self::UnknownWordType { .. } | Self::VectorWithoutBase { .. }
        )
    }

    /// Index of the offending word, for errors tied to one word.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnknownWordType { position, .. } | Self::VectorWithoutBase { position } => {
                Some(*position)
            }
            _ => None,
        }
    }
}

/// Base address set by VECT_BASE_X and advanced by each vector word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VectorBase {
    x: u16,
    polarity: u8,
}

/// Registers of one decode pass.
#[derive(Debug, Default)]
struct DecoderState {
    current_y: u16,
    vector_base: Option<VectorBase>,
    time: TimestampReconstructor,
    synced: bool,
}

/// Word counters of the most recent decode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Words read from the input.
    pub words: usize,
    /// Words discarded while waiting for the first TIME_HIGH.
    pub unsynced_words: usize,
    /// Reserved-type words skipped in lenient mode.
    pub skipped_words: usize,
    /// CONTINUED and OTHERS words consumed without effect on CD events.
    pub extension_words: usize,
}

/// Stateful EVT 3.0 decoder.
///
/// A decoder can be reused for any number of inputs; the registers are reset
/// at the start of every decode, so no state carries over between inputs.
/// Independent decoders share nothing and can run on separate threads.
#[derive(Debug, Default)]
pub struct Evt3Decoder {
    config: DecoderConfig,
    state: DecoderState,
    stats: DecodeStats,
}

impl Evt3Decoder {
    /// Creates a decoder with the default configuration (1280x720, strict).
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Creates a decoder with the given configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            state: DecoderState::default(),
            stats: DecodeStats::default(),
        }
    }

    /// The configuration this decoder was built with.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Counters from the most recent decode.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Resets the decoder registers for an input without a file header.
    pub fn reset(&mut self) {
        self.reset_for(false);
    }

    fn reset_for(&mut self, has_header: bool) {
        self.state = DecoderState {
            synced: !self.config.time_sync.applies(has_header),
            ..DecoderState::default()
        };
        self.stats = DecodeStats::default();
    }

    /// Decodes a buffer of little-endian EVT 3.0 words.
    ///
    /// The buffer must not contain a file header; see [`decode_file`](Self::decode_file)
    /// for recordings.
    pub fn decode_bytes(
        &mut self,
        bytes: &[u8],
    ) -> Result<(DecodeResult, TriggerResult), DecodeError> {
        let words = WordStream::new(bytes)?;
        self.decode_stream(words, self.config.sensor, false)
    }

    /// Decodes words that have already been framed.
    pub fn decode_words(
        &mut self,
        words: &[u16],
    ) -> Result<(DecodeResult, TriggerResult), DecodeError> {
        self.decode_stream(words.iter().copied(), self.config.sensor, false)
    }

    /// Decodes an EVT 3.0 recording from disk.
    ///
    /// The `%` header, if present, is stripped. Its geometry takes precedence
    /// over the configured sensor; without one the configured sensor is used.
    /// Under [`TimeSync::Auto`](crate::TimeSync::Auto) a recording with a
    /// header is decoded from its first TIME_HIGH.
    pub fn decode_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<(DecodeResult, TriggerResult), DecodeError> {
        let data = std::fs::read(path.as_ref())?;
        let (header, body) = header::split_header(&data);
        let sensor = header.geometry_or(self.config.sensor);
        debug!(
            "{}: {} header bytes, sensor {}x{}",
            path.as_ref().display(),
            header.len,
            sensor.width,
            sensor.height
        );
        self.decode_stream(WordStream::new(body)?, sensor, header.len > 0)
    }

    /// Decodes a recording with the configured geometry, ignoring any
    /// geometry recorded in its header.
    pub fn decode_file_as_configured<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<(DecodeResult, TriggerResult), DecodeError> {
        let data = std::fs::read(path.as_ref())?;
        let (header, body) = header::split_header(&data);
        self.decode_stream(WordStream::new(body)?, self.config.sensor, header.len > 0)
    }

    fn decode_stream<I>(
        &mut self,
        words: I,
        sensor: SensorMetadata,
        has_header: bool,
    ) -> Result<(DecodeResult, TriggerResult), DecodeError>
    where
        I: Iterator<Item = u16>,
    {
        self.reset_for(has_header);

        let mut events = match self.config.capacity_hint {
            Some(rows) => EventColumns::with_capacity_hint(rows)?,
            None => EventColumns::new(),
        };
        let mut triggers = TriggerColumns::new();

        for (position, word) in words.enumerate() {
            self.process_word(word, position, &mut events, &mut triggers)?;
        }

        debug!(
            "decoded {} words into {} CD events and {} triggers",
            self.stats.words,
            events.len(),
            triggers.len()
        );
        if self.stats.unsynced_words > 0 {
            debug!(
                "discarded {} words before the first TIME_HIGH",
                self.stats.unsynced_words
            );
        }
        if self.stats.skipped_words > 0 {
            warn!(
                "skipped {} words with reserved type nibbles",
                self.stats.skipped_words
            );
        }

        Ok((
            DecodeResult::from_columns(events, sensor),
            TriggerResult::from_columns(triggers),
        ))
    }

    /// Applies one word to the decoder state, emitting any events it encodes.
    #[inline]
    fn process_word(
        &mut self,
        word: u16,
        position: usize,
        events: &mut EventColumns,
        triggers: &mut TriggerColumns,
    ) -> Result<(), DecodeError> {
        self.stats.words = position + 1;
        let kind = parser::word_kind(word);
        let state = &mut self.state;

        if !state.synced {
            if kind != WordKind::TimeHigh {
                self.stats.unsynced_words += 1;
                return Ok(());
            }
            state.synced = true;
        }

        match kind {
            WordKind::AddrX => {
                events.push(
                    parser::column(word),
                    state.current_y,
                    parser::polarity(word),
                    state.time.current_time(),
                )?;
            }

            WordKind::Vect12 | WordKind::Vect8 => {
                let (mask, width) = if kind == WordKind::Vect12 {
                    (parser::vect_12_mask(word), VECT_12_WIDTH)
                } else {
                    (parser::vect_8_mask(word), VECT_8_WIDTH)
                };
                let base = state
                    .vector_base
                    .as_mut()
                    .ok_or(DecodeError::VectorWithoutBase { position })?;
                base.x = vector::expand(
                    events,
                    mask,
                    width,
                    base.x,
                    state.current_y,
                    base.polarity,
                    state.time.current_time(),
                )?;
            }

            WordKind::AddrY => {
                state.current_y = parser::addr_y_row(word);
            }

            WordKind::VectBaseX => {
                state.vector_base = Some(VectorBase {
                    x: parser::column(word),
                    polarity: parser::polarity(word),
                });
            }

            WordKind::TimeHigh => {
                state.time.on_time_high(parser::time_fragment(word));
            }

            WordKind::TimeLow => {
                state.time.on_time_low(parser::time_fragment(word));
            }

            WordKind::ExtTrigger => {
                triggers.push(
                    parser::trigger_channel(word),
                    parser::trigger_polarity(word),
                    state.time.current_time(),
                )?;
            }

            WordKind::Continued4 | WordKind::Continued12 | WordKind::Others => {
                // Extension payloads carry no CD event information.
                self.stats.extension_words += 1;
            }

            WordKind::Reserved(nibble) => match self.config.unknown_words {
                UnknownWordPolicy::Fail => {
                    return Err(DecodeError::UnknownWordType { nibble, position });
                }
                UnknownWordPolicy::Skip => {
                    trace!("skipping reserved word {:#06x} at {}", word, position);
                    self.stats.skipped_words += 1;
                }
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(words: &[u16]) -> (DecodeResult, TriggerResult) {
        Evt3Decoder::new().decode_words(words).unwrap()
    }

    #[test]
    fn test_decoder_initial_state() {
        let decoder = Evt3Decoder::new();
        assert_eq!(decoder.state.time.current_time(), 0);
        assert_eq!(decoder.state.current_y, 0);
        assert_eq!(decoder.state.vector_base, None);
        assert_eq!(decoder.config().sensor, SensorMetadata::default());
    }

    #[test]
    fn test_decode_simple_sequence() {
        // 1. TIME_HIGH with value 0
        // 2. TIME_LOW with value 100
        // 3. ADDR_Y with y=50
        // 4. ADDR_X with x=100, pol=1
        let (events, _) = decode(&[0x8000, 0x6064, 0x0032, 0x2864]);

        assert_eq!(events.len(), 1);
        assert_eq!(events.x()[0], 100);
        assert_eq!(events.y()[0], 50);
        assert_eq!(events.polarity()[0], 1);
        assert_eq!(events.timestamp()[0], 100);
    }

    #[test]
    fn test_decode_vector_events() {
        let (events, _) = decode(&[
            0x8000, // TIME_HIGH
            0x60C8, // TIME_LOW: 200
            0x0064, // ADDR_Y: y=100
            0x3000, // VECT_BASE_X: x=0, pol=0
            0x4E38, // VECT_12: valid=0b111000111000
        ]);

        assert_eq!(events.x(), &[3, 4, 5, 9, 10, 11]);
        assert!(events.y().iter().all(|&y| y == 100));
        assert!(events.polarity().iter().all(|&p| p == 0));
        assert!(events.timestamp().iter().all(|&t| t == 200));
    }

    #[test]
    fn test_vectors_continue_from_previous_base() {
        let (events, _) = decode(&[
            0x0001, // ADDR_Y: y=1
            0x3800, // VECT_BASE_X: x=0, pol=1
            0x4000, // VECT_12: empty, base -> 12
            0x5001, // VECT_8: bit 0 -> x=12, base -> 20
            0x4001, // VECT_12: bit 0 -> x=20
        ]);
        assert_eq!(events.x(), &[12, 20]);
        assert_eq!(events.polarity(), &[1, 1]);
    }

    #[test]
    fn test_vect_base_x_emits_nothing() {
        let (events, _) = decode(&[0x8000, 0x0005, 0x39F4]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_vector_without_base_fails() {
        let err = Evt3Decoder::new()
            .decode_words(&[0x8000, 0x0001, 0x4001])
            .unwrap_err();
        assert!(matches!(err, DecodeError::VectorWithoutBase { position: 2 }));
        assert!(err.is_malformed());
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn test_vector_without_base_fails_even_when_lenient() {
        let mut decoder = Evt3Decoder::with_config(DecoderConfig::default().lenient());
        let err = decoder.decode_words(&[0x5001]).unwrap_err();
        assert!(matches!(err, DecodeError::VectorWithoutBase { position: 0 }));
    }

    #[test]
    fn test_reserved_word_strict() {
        let err = Evt3Decoder::new()
            .decode_words(&[0x8000, 0x2001, 0x9123])
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownWordType {
                nibble: 0x9,
                position: 2
            }
        ));
    }

    #[test]
    fn test_reserved_word_lenient() {
        let mut decoder = Evt3Decoder::with_config(DecoderConfig::default().lenient());
        let (events, _) = decoder
            .decode_words(&[0x8000, 0x1FFF, 0x2001, 0xD000, 0x2002])
            .unwrap();
        assert_eq!(events.x(), &[1, 2]);
        assert_eq!(decoder.stats().skipped_words, 2);
        assert_eq!(decoder.stats().words, 5);
    }

    #[test]
    fn test_extension_words_are_ignored() {
        let mut decoder = Evt3Decoder::new();
        let (events, triggers) = decoder
            .decode_words(&[0x8000, 0xE123, 0x7005, 0xFABC, 0x2001])
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(triggers.is_empty());
        assert_eq!(decoder.stats().extension_words, 3);
    }

    #[test]
    fn test_trigger_decoding() {
        let (events, triggers) = decode(&[
            0x8001, // TIME_HIGH: 1
            0x6010, // TIME_LOW: 16
            0xA201, // EXT_TRIGGER: channel 2, rising
            0xA200, // EXT_TRIGGER: channel 2, falling
        ]);
        assert!(events.is_empty());
        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers.channel(), &[2, 2]);
        assert_eq!(triggers.polarity(), &[1, 0]);
        assert_eq!(triggers.timestamp(), &[4096 + 16, 4096 + 16]);
    }

    #[test]
    fn test_time_high_wrap_keeps_order() {
        let (events, _) = decode(&[
            0x8FFF, // TIME_HIGH: 4095
            0x6FFF, // TIME_LOW: 4095
            0x2001, // ADDR_X
            0x8000, // TIME_HIGH wraps to 0
            0x6001, // TIME_LOW: 1
            0x2002, // ADDR_X
        ]);
        let t = events.timestamp();
        assert_eq!(t[0], (0xFFF << 12) | 0xFFF);
        assert_eq!(t[1], (1 << 24) | 1);
        assert!(t[0] < t[1]);
    }

    #[test]
    fn test_repeated_time_high_keeps_low_fragment() {
        let (events, _) = decode(&[
            0x8005, // TIME_HIGH: 5
            0x6FA0, // TIME_LOW: 4000
            0x0001, // ADDR_Y: 1
            0x2001, // ADDR_X
            0x8005, // TIME_HIGH: 5 again
            0x2002, // ADDR_X
        ]);
        assert_eq!(events.timestamp(), &[24480, 24480]);
    }

    #[test]
    fn test_first_time_high_after_time_low_keeps_low_fragment() {
        let (events, _) = decode(&[0x6064, 0x2001, 0x8000, 0x2002]);
        assert_eq!(events.timestamp(), &[100, 100]);
    }

    #[test]
    fn test_words_before_time_high_are_kept_by_default() {
        let (events, _) = decode(&[0x6064, 0x000A, 0x2005]);
        assert_eq!(events.timestamp(), &[100]);
        assert_eq!(events.y(), &[10]);
    }

    #[test]
    fn test_sync_on_time_high() {
        let mut decoder =
            Evt3Decoder::with_config(DecoderConfig::default().sync_on_time_high(true));
        let (events, _) = decoder
            .decode_words(&[0x4FFF, 0x2001, 0x9000, 0x8002, 0x2003])
            .unwrap();
        assert_eq!(events.x(), &[3]);
        assert_eq!(events.timestamp(), &[2 << 12]);
        assert_eq!(decoder.stats().unsynced_words, 3);
    }

    #[test]
    fn test_state_does_not_leak_between_decodes() {
        let mut decoder = Evt3Decoder::new();
        decoder.decode_words(&[0x8005, 0x0010, 0x3100]).unwrap();

        let err = decoder.decode_words(&[0x4001]).unwrap_err();
        assert!(matches!(err, DecodeError::VectorWithoutBase { .. }));

        let (events, _) = decoder.decode_words(&[0x2001]).unwrap();
        assert_eq!(events.y(), &[0]);
        assert_eq!(events.timestamp(), &[0]);
    }

    #[test]
    fn test_odd_byte_buffer() {
        let err = Evt3Decoder::new().decode_bytes(&[0x00]).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_configured_geometry_is_attached() {
        let mut decoder = Evt3Decoder::with_config(DecoderConfig::for_sensor(640, 480));
        let (events, _) = decoder.decode_bytes(&[]).unwrap();
        assert_eq!(events.sensor_size(), (640, 480));
        assert!(events.is_empty());
    }
}
