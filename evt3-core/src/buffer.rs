//! Append-only columnar accumulators for decoded events and triggers.
//!
//! Each column is a separate `Vec`, indexed in parallel. Capacity is grown
//! with `try_reserve` so that an allocation failure on a very large recording
//! is reported as [`DecodeError::Allocation`] instead of aborting the process.

use crate::decoder::DecodeError;

/// Smallest number of rows added when a column has to grow.
const MIN_GROWTH: usize = 4096;

/// Reserves `additional` rows in `column`, mapping failure to a decode error.
fn try_grow<T>(column: &mut Vec<T>, name: &'static str, additional: usize) -> Result<(), DecodeError> {
    column
        .try_reserve(additional)
        .map_err(|_| DecodeError::Allocation {
            column: name,
            requested: column.len().saturating_add(additional),
        })
}

/// Number of rows to add so that at least `needed` more rows fit, doubling the
/// current length to keep appends amortized O(1).
#[inline]
fn growth(len: usize, needed: usize) -> usize {
    needed.max(len).max(MIN_GROWTH)
}

/// Columnar storage for CD events.
#[derive(Debug, Default)]
pub struct EventColumns {
    pub(crate) x: Vec<u16>,
    pub(crate) y: Vec<u16>,
    pub(crate) polarity: Vec<u8>,
    pub(crate) timestamp: Vec<u64>,
}

impl EventColumns {
    /// Creates empty columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates columns pre-sized for `rows` events.
    pub fn with_capacity_hint(rows: usize) -> Result<Self, DecodeError> {
        let mut columns = Self::new();
        columns.reserve_exact(rows)?;
        Ok(columns)
    }

    /// Number of events stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` if no events are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Rows that can be appended without reallocating.
    #[inline]
    fn spare(&self) -> usize {
        // All columns are grown together, so the smallest spare capacity
        // bounds the whole row.
        (self.x.capacity() - self.x.len())
            .min(self.y.capacity() - self.y.len())
            .min(self.polarity.capacity() - self.polarity.len())
            .min(self.timestamp.capacity() - self.timestamp.len())
    }

    fn reserve_exact(&mut self, additional: usize) -> Result<(), DecodeError> {
        try_grow(&mut self.x, "x", additional)?;
        try_grow(&mut self.y, "y", additional)?;
        try_grow(&mut self.polarity, "polarity", additional)?;
        try_grow(&mut self.timestamp, "timestamp", additional)?;
        Ok(())
    }

    /// Ensures room for at least `additional` more events.
    #[inline]
    pub fn reserve(&mut self, additional: usize) -> Result<(), DecodeError> {
        if self.spare() >= additional {
            return Ok(());
        }
        self.reserve_exact(growth(self.len(), additional))
    }

    /// Appends one event.
    #[inline]
    pub fn push(&mut self, x: u16, y: u16, polarity: u8, timestamp: u64) -> Result<(), DecodeError> {
        self.reserve(1)?;
        self.push_reserved(x, y, polarity, timestamp);
        Ok(())
    }

    /// Appends one event into capacity obtained from [`reserve`](Self::reserve).
    #[inline]
    pub(crate) fn push_reserved(&mut self, x: u16, y: u16, polarity: u8, timestamp: u64) {
        debug_assert!(self.spare() > 0);
        self.x.push(x);
        self.y.push(y);
        self.polarity.push(polarity);
        self.timestamp.push(timestamp);
    }
}

/// Columnar storage for external trigger events.
#[derive(Debug, Default)]
pub struct TriggerColumns {
    pub(crate) channel: Vec<u8>,
    pub(crate) polarity: Vec<u8>,
    pub(crate) timestamp: Vec<u64>,
}

impl TriggerColumns {
    /// Creates empty columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triggers stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Returns `true` if no triggers are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Appends one trigger.
    pub fn push(&mut self, channel: u8, polarity: u8, timestamp: u64) -> Result<(), DecodeError> {
        if self.channel.len() == self.channel.capacity()
            || self.polarity.len() == self.polarity.capacity()
            || self.timestamp.len() == self.timestamp.capacity()
        {
            // Triggers are rare compared to CD events; start small.
            let additional = self.len().max(64);
            try_grow(&mut self.channel, "trigger_channel", additional)?;
            try_grow(&mut self.polarity, "trigger_polarity", additional)?;
            try_grow(&mut self.timestamp, "trigger_timestamp", additional)?;
        }
        self.channel.push(channel);
        self.polarity.push(polarity);
        self.timestamp.push(timestamp);
        Ok(())
    }
}
