//! Read-only columnar results handed to consumers.

use crate::buffer::{EventColumns, TriggerColumns};
use crate::types::{CdEvent, SensorMetadata, TriggerEvent};
use std::fmt;

/// Column names of [`DecodeResult`], in projection order.
pub const EVENT_COLUMNS: [&str; 4] = ["x", "y", "polarity", "timestamp"];

/// Column names of [`TriggerResult`], in projection order.
pub const TRIGGER_COLUMNS: [&str; 3] = ["channel", "polarity", "timestamp"];

/// A borrowed view of one typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column<'a> {
    /// `polarity`, `channel`
    U8(&'a [u8]),
    /// `x`, `y`
    U16(&'a [u16]),
    /// `timestamp`
    U64(&'a [u64]),
}

impl Column<'_> {
    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::U8(c) => c.len(),
            Column::U16(c) => c.len(),
            Column::U64(c) => c.len(),
        }
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`, widened to `u64`.
    pub fn get(&self, index: usize) -> Option<u64> {
        match self {
            Column::U8(c) => c.get(index).map(|&v| u64::from(v)),
            Column::U16(c) => c.get(index).map(|&v| u64::from(v)),
            Column::U64(c) => c.get(index).copied(),
        }
    }
}

/// Decoded CD events plus the sensor geometry they were decoded for.
///
/// Columns are parallel: index `i` of every column describes the same event,
/// in the order the events appeared in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    x: Vec<u16>,
    y: Vec<u16>,
    polarity: Vec<u8>,
    timestamp: Vec<u64>,
    metadata: SensorMetadata,
}

impl DecodeResult {
    pub(crate) fn from_columns(columns: EventColumns, metadata: SensorMetadata) -> Self {
        let EventColumns {
            x,
            y,
            polarity,
            timestamp,
        } = columns;
        Self {
            x,
            y,
            polarity,
            timestamp,
            metadata,
        }
    }

    /// An empty result for the given geometry.
    pub fn empty(metadata: SensorMetadata) -> Self {
        Self::from_columns(EventColumns::new(), metadata)
    }

    /// Number of events.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` if no events were decoded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// X coordinates.
    pub fn x(&self) -> &[u16] {
        &self.x
    }

    /// Y coordinates.
    pub fn y(&self) -> &[u16] {
        &self.y
    }

    /// Polarities: 0 = OFF, 1 = ON.
    pub fn polarity(&self) -> &[u8] {
        &self.polarity
    }

    /// Alias for [`polarity`](Self::polarity).
    pub fn p(&self) -> &[u8] {
        &self.polarity
    }

    /// Timestamps in ticks.
    pub fn timestamp(&self) -> &[u64] {
        &self.timestamp
    }

    /// Alias for [`timestamp`](Self::timestamp).
    pub fn t(&self) -> &[u64] {
        &self.timestamp
    }

    /// Sensor geometry this result was decoded for.
    pub fn metadata(&self) -> SensorMetadata {
        self.metadata
    }

    /// Sensor width in pixels.
    pub fn sensor_width(&self) -> u32 {
        self.metadata.width
    }

    /// Sensor height in pixels.
    pub fn sensor_height(&self) -> u32 {
        self.metadata.height
    }

    /// `(width, height)` of the sensor.
    pub fn sensor_size(&self) -> (u32, u32) {
        (self.metadata.width, self.metadata.height)
    }

    /// Looks up a column by name. Accepts the `p` and `t` aliases.
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        match name {
            "x" => Some(Column::U16(&self.x)),
            "y" => Some(Column::U16(&self.y)),
            "polarity" | "p" => Some(Column::U8(&self.polarity)),
            "timestamp" | "t" => Some(Column::U64(&self.timestamp)),
            _ => None,
        }
    }

    /// All columns keyed by name, in `x, y, polarity, timestamp` order.
    pub fn columns(&self) -> [(&'static str, Column<'_>); 4] {
        [
            ("x", Column::U16(&self.x)),
            ("y", Column::U16(&self.y)),
            ("polarity", Column::U8(&self.polarity)),
            ("timestamp", Column::U64(&self.timestamp)),
        ]
    }

    /// Row view of event `index`.
    pub fn get(&self, index: usize) -> Option<CdEvent> {
        Some(CdEvent::new(
            *self.x.get(index)?,
            self.y[index],
            self.polarity[index],
            self.timestamp[index],
        ))
    }

    /// Iterates over row views in stream order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = CdEvent> + '_ {
        (0..self.len()).map(move |i| {
            CdEvent::new(self.x[i], self.y[i], self.polarity[i], self.timestamp[i])
        })
    }

    /// Moves the columns out as `(x, y, polarity, timestamp)`.
    pub fn into_columns(self) -> (Vec<u16>, Vec<u16>, Vec<u8>, Vec<u64>) {
        (self.x, self.y, self.polarity, self.timestamp)
    }
}

impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Events(count={}, sensor={}x{})",
            self.len(),
            self.metadata.width,
            self.metadata.height
        )
    }
}

/// Decoded external trigger events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerResult {
    channel: Vec<u8>,
    polarity: Vec<u8>,
    timestamp: Vec<u64>,
}

impl TriggerResult {
    pub(crate) fn from_columns(columns: TriggerColumns) -> Self {
        let TriggerColumns {
            channel,
            polarity,
            timestamp,
        } = columns;
        Self {
            channel,
            polarity,
            timestamp,
        }
    }

    /// Number of triggers.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Returns `true` if no triggers were decoded.
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Trigger channel IDs.
    pub fn channel(&self) -> &[u8] {
        &self.channel
    }

    /// Edge polarities: 0 = falling, 1 = rising.
    pub fn polarity(&self) -> &[u8] {
        &self.polarity
    }

    /// Alias for [`polarity`](Self::polarity).
    pub fn p(&self) -> &[u8] {
        &self.polarity
    }

    /// Trigger timestamps, on the same timebase as CD events.
    pub fn timestamp(&self) -> &[u64] {
        &self.timestamp
    }

    /// Alias for [`timestamp`](Self::timestamp).
    pub fn t(&self) -> &[u64] {
        &self.timestamp
    }

    /// Looks up a column by name. Accepts the `p` and `t` aliases.
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        match name {
            "channel" => Some(Column::U8(&self.channel)),
            "polarity" | "p" => Some(Column::U8(&self.polarity)),
            "timestamp" | "t" => Some(Column::U64(&self.timestamp)),
            _ => None,
        }
    }

    /// All columns keyed by name, in `channel, polarity, timestamp` order.
    pub fn columns(&self) -> [(&'static str, Column<'_>); 3] {
        [
            ("channel", Column::U8(&self.channel)),
            ("polarity", Column::U8(&self.polarity)),
            ("timestamp", Column::U64(&self.timestamp)),
        ]
    }

    /// Row view of trigger `index`.
    pub fn get(&self, index: usize) -> Option<TriggerEvent> {
        Some(TriggerEvent::new(
            *self.channel.get(index)?,
            self.polarity[index],
            self.timestamp[index],
        ))
    }

    /// Iterates over row views in stream order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = TriggerEvent> + '_ {
        (0..self.len())
            .map(move |i| TriggerEvent::new(self.channel[i], self.polarity[i], self.timestamp[i]))
    }

    /// Moves the columns out as `(channel, polarity, timestamp)`.
    pub fn into_columns(self) -> (Vec<u8>, Vec<u8>, Vec<u64>) {
        (self.channel, self.polarity, self.timestamp)
    }
}

impl fmt::Display for TriggerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Triggers(count={})", self.len())
    }
}
