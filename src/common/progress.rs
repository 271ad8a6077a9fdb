//! Upload progress normalization.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Callback receiving upload progress as a whole percentage.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Integer percentage of `sent` over `total`, clamped to 0..=100.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (sent as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Turns raw transport progress into a clean percentage stream.
///
/// Emissions are clamped and strictly increasing; `finish()` guarantees the
/// last emission of a successful transfer is exactly 100.
pub struct ProgressReporter {
    total: u64,
    // last emitted percentage + 1, 0 when nothing has been emitted yet
    last: AtomicU16,
    callback: ProgressFn,
}

impl ProgressReporter {
    pub fn new(total: u64, callback: ProgressFn) -> Self {
        Self {
            total,
            last: AtomicU16::new(0),
            callback,
        }
    }

    /// Report cumulative bytes handed to the transport.
    pub fn report_bytes(&self, sent: u64) {
        self.report_percent(percent_of(sent, self.total));
    }

    /// Report a percentage directly. Values outside 0..=100 are clamped.
    pub fn report_percent(&self, pct: u8) {
        let pct = pct.min(100);
        let tagged = pct as u16 + 1;
        let prev = self.last.fetch_max(tagged, Ordering::AcqRel);
        if tagged > prev {
            (self.callback)(pct);
        }
    }

    /// Mark the transfer as successful.
    pub fn finish(&self) {
        self.report_percent(100);
    }

    /// Last percentage emitted, if any.
    pub fn last(&self) -> Option<u8> {
        match self.last.load(Ordering::Acquire) {
            0 => None,
            tagged => Some((tagged - 1) as u8),
        }
    }
}
