//! Output format writers for decoded EVT 3.0 data.
//!
//! Supports CSV and a flat little-endian binary layout. Writers consume the
//! columnar [`DecodeResult`] / [`TriggerResult`] row by row.

use crate::result::{DecodeResult, TriggerResult};
use crate::types::{CdEvent, SensorMetadata};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Magic bytes opening a binary event file.
pub const BINARY_MAGIC: &[u8; 8] = b"EVT3BIN\0";

/// Version of the binary layout written by [`BinaryWriter`].
pub const BINARY_VERSION: u32 = 1;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Field ordering for output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// x, y, p, t
    #[default]
    XYPT,
    /// t, x, y, p
    TXYP,
    /// x, y, t, p
    XYTP,
    /// Custom order given as field indices (x=0, y=1, p=2, t=3)
    Custom([usize; 4]),
}

const FIELD_NAMES: [&str; 4] = ["x", "y", "polarity", "timestamp"];

impl std::str::FromStr for FieldOrder {
    type Err = OutputError;

    /// Parses a field order from a format string like "x,y,p,t" or "t,x,y,p".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<String> = s.split(',').map(|p| p.trim().to_lowercase()).collect();

        if parts.len() != 4 {
            return Err(OutputError::InvalidFormat(
                "Format must have exactly 4 fields: x, y, p, t".to_string(),
            ));
        }

        let mut indices = [0usize; 4];
        let mut used = [false; 4];

        for (i, part) in parts.iter().enumerate() {
            let field_idx = match part.as_str() {
                "x" => 0,
                "y" => 1,
                "p" | "pol" | "polarity" => 2,
                "t" | "time" | "timestamp" => 3,
                _ => {
                    return Err(OutputError::InvalidFormat(format!(
                        "Unknown field: {}. Use x, y, p, t",
                        part
                    )))
                }
            };

            if used[field_idx] {
                return Err(OutputError::InvalidFormat(format!(
                    "Duplicate field: {}",
                    part
                )));
            }

            indices[i] = field_idx;
            used[field_idx] = true;
        }

        Ok(match indices {
            [0, 1, 2, 3] => Self::XYPT,
            [3, 0, 1, 2] => Self::TXYP,
            [0, 1, 3, 2] => Self::XYTP,
            _ => Self::Custom(indices),
        })
    }
}

impl FieldOrder {
    /// Field indices in output order.
    pub fn indices(&self) -> [usize; 4] {
        match self {
            Self::XYPT => [0, 1, 2, 3],
            Self::TXYP => [3, 0, 1, 2],
            Self::XYTP => [0, 1, 3, 2],
            Self::Custom(indices) => *indices,
        }
    }

    /// Column names in output order, comma-separated.
    pub fn header(&self) -> String {
        self.indices()
            .iter()
            .map(|&i| FIELD_NAMES[i])
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// CSV output writer for CD events.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
    field_order: FieldOrder,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a new CSV writer.
    pub fn new(writer: W, field_order: FieldOrder) -> Self {
        Self {
            writer: BufWriter::new(writer),
            field_order,
        }
    }

    /// Writes the `%geometry:W,H` comment line, if given.
    ///
    /// No column-name row follows; see [`FieldOrder::header`] for the names.
    pub fn write_header(&mut self, metadata: Option<&SensorMetadata>) -> Result<(), OutputError> {
        if let Some(meta) = metadata {
            writeln!(self.writer, "%geometry:{},{}", meta.width, meta.height)?;
        }
        Ok(())
    }

    /// Writes every event of a decode result.
    pub fn write_events(&mut self, events: &DecodeResult) -> Result<(), OutputError> {
        for event in events.iter() {
            self.write_event(&event)?;
        }
        Ok(())
    }

    /// Writes a single CD event.
    #[inline]
    pub fn write_event(&mut self, event: &CdEvent) -> Result<(), OutputError> {
        match self.field_order {
            FieldOrder::XYPT => writeln!(
                self.writer,
                "{},{},{},{}",
                event.x, event.y, event.polarity, event.timestamp
            )?,
            FieldOrder::TXYP => writeln!(
                self.writer,
                "{},{},{},{}",
                event.timestamp, event.x, event.y, event.polarity
            )?,
            FieldOrder::XYTP => writeln!(
                self.writer,
                "{},{},{},{}",
                event.x, event.y, event.timestamp, event.polarity
            )?,
            FieldOrder::Custom(indices) => {
                let values = [
                    u64::from(event.x),
                    u64::from(event.y),
                    u64::from(event.polarity),
                    event.timestamp,
                ];
                writeln!(
                    self.writer,
                    "{},{},{},{}",
                    values[indices[0]], values[indices[1]], values[indices[2]], values[indices[3]]
                )?;
            }
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV writer for trigger events, one `polarity,channel,timestamp` row each.
pub struct TriggerCsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> TriggerCsvWriter<W> {
    /// Creates a new trigger CSV writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes every trigger of a decode result.
    pub fn write_events(&mut self, triggers: &TriggerResult) -> Result<(), OutputError> {
        for trigger in triggers.iter() {
            writeln!(
                self.writer,
                "{},{},{}",
                trigger.polarity, trigger.channel, trigger.timestamp
            )?;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Binary output format for CD events.
///
/// A 28-byte header (`EVT3BIN\0`, version u32, width u32, height u32, event
/// count u64) is followed by one 14-byte record per event:
/// - x: u16
/// - y: u16
/// - polarity: u8
/// - padding: u8
/// - timestamp: u64
///
/// All integers are little-endian.
pub struct BinaryWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> BinaryWriter<W> {
    /// Creates a new binary writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the file header.
    pub fn write_header(
        &mut self,
        metadata: &SensorMetadata,
        event_count: u64,
    ) -> Result<(), OutputError> {
        self.writer.write_all(BINARY_MAGIC)?;
        self.writer.write_u32::<LittleEndian>(BINARY_VERSION)?;
        self.writer.write_u32::<LittleEndian>(metadata.width)?;
        self.writer.write_u32::<LittleEndian>(metadata.height)?;
        self.writer.write_u64::<LittleEndian>(event_count)?;
        Ok(())
    }

    /// Writes every event of a decode result.
    pub fn write_events(&mut self, events: &DecodeResult) -> Result<(), OutputError> {
        for event in events.iter() {
            self.writer.write_u16::<LittleEndian>(event.x)?;
            self.writer.write_u16::<LittleEndian>(event.y)?;
            self.writer.write_all(&[event.polarity, 0])?;
            self.writer.write_u64::<LittleEndian>(event.timestamp)?;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes CD events to a CSV file.
pub fn write_csv<P: AsRef<Path>>(
    path: P,
    events: &DecodeResult,
    field_order: FieldOrder,
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = CsvWriter::new(file, field_order);
    writer.write_header(Some(&events.metadata()))?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}

/// Writes trigger events to a CSV file.
pub fn write_trigger_csv<P: AsRef<Path>>(
    path: P,
    triggers: &TriggerResult,
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = TriggerCsvWriter::new(file);
    writer.write_events(triggers)?;
    writer.flush()?;
    Ok(())
}

/// Writes CD events to a binary file.
pub fn write_binary<P: AsRef<Path>>(path: P, events: &DecodeResult) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = BinaryWriter::new(file);
    writer.write_header(&events.metadata(), events.len() as u64)?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}
