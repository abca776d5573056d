//! Reconstruction of 64-bit timestamps from 12-bit TIME_LOW / TIME_HIGH
//! fragments.

/// Number of ticks covered by one 12-bit fragment.
pub const FRAGMENT_SPAN: u64 = 1 << 12;

/// Timestamp reconstructor.
///
/// The stream carries time as two 12-bit fragments. TIME_HIGH selects a
/// 4096-tick period and TIME_LOW the tick within it. A TIME_HIGH value lower
/// than the previous one means the 24-bit counter wrapped, which is folded
/// into `high_epoch` so that [`current_time`](Self::current_time) never
/// decreases.
#[derive(Debug, Clone, Default)]
pub struct TimestampReconstructor {
    time_low_raw: u16,
    last_high_raw: Option<u16>,
    high_epoch: u64,
    current_time: u64,
}

impl TimestampReconstructor {
    /// Creates a reconstructor at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a TIME_HIGH fragment.
    ///
    /// The low fragment restarts at 0 when the high period advances. A
    /// TIME_HIGH repeating the current period keeps it.
    #[inline]
    pub fn on_time_high(&mut self, raw: u16) {
        let raw = raw & 0x0FFF;
        let previous = self.high_value();
        if let Some(last) = self.last_high_raw {
            if raw < last {
                self.high_epoch += 1;
            }
        }
        self.last_high_raw = Some(raw);
        if self.high_value() > previous {
            self.time_low_raw = 0;
        }
        self.recompute();
    }

    /// Feeds a TIME_LOW fragment.
    #[inline]
    pub fn on_time_low(&mut self, raw: u16) {
        self.time_low_raw = raw & 0x0FFF;
        self.recompute();
    }

    /// Wrap-corrected high fragment. Before any TIME_HIGH it is 0.
    #[inline]
    fn high_value(&self) -> u64 {
        self.high_epoch * FRAGMENT_SPAN + u64::from(self.last_high_raw.unwrap_or(0))
    }

    #[inline]
    fn recompute(&mut self) {
        self.current_time = (self.high_value() << 12) | u64::from(self.time_low_raw);
    }

    /// The reconstructed timestamp, in ticks.
    #[inline]
    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    /// Number of TIME_HIGH wraparounds absorbed so far.
    pub fn high_epoch(&self) -> u64 {
        self.high_epoch
    }

    /// Whether at least one TIME_HIGH fragment has been seen.
    pub fn has_time_high(&self) -> bool {
        self.last_high_raw.is_some()
    }
}
