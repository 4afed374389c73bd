//! Lock-free counters shared by the workers of a phase.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counts claimed sequence numbers, completed operations and slowdowns within one phase.
///
/// All updates are single atomic increments, so any number of workers can share one counter
/// without losing updates.
#[derive(Debug, Default)]
pub struct WorkloadCounter {
    sequence: AtomicU64,
    completed: AtomicU64,
    slowdowns: AtomicU64,
}

impl WorkloadCounter {
    /// Creates a counter with all tallies at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the next sequence number.
    ///
    /// The first claim returns `1`. Every claim returns a distinct value, and the values handed
    /// out are always exactly `1..=n` after `n` claims.
    pub fn claim(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Records a completed operation and its latency.
    ///
    /// The operation counts as a slowdown if it took longer than `threshold`.
    pub fn record(&self, latency: Duration, threshold: Option<Duration>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if threshold.is_some_and(|threshold| latency > threshold) {
            self.record_slowdown();
        }
    }

    /// Number of completed operations.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Adds one slowdown event.
    pub fn record_slowdown(&self) {
        self.slowdowns.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of slowdown events.
    pub fn slowdowns(&self) -> u64 {
        self.slowdowns.load(Ordering::Relaxed)
    }
}
