//! Observability counters for the throttle.
//!
//! Process-wide totals across every category, for monitoring and debugging.
//! Per-category window counts live in [`crate::application::stats`]; these
//! counters track cumulative decision volume instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cumulative throttle statistics.
///
/// All counters use atomic operations; clones share the same totals.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Checks that produced a plain allow
    decisions_allowed: AtomicU64,
    /// Checks allowed with a utilization warning
    decisions_warned: AtomicU64,
    /// Checks denied for any reason
    decisions_denied: AtomicU64,
    /// Ledger entries removed by eviction (per-call and sweeper)
    entries_swept: AtomicU64,
}

impl Metrics {
    /// Create a zeroed metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.decisions_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_warned(&self) {
        self.inner.decisions_warned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denied(&self) {
        self.inner.decisions_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_swept(&self, entries: usize) {
        self.inner
            .entries_swept
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    /// Total plain-allowed decisions.
    pub fn decisions_allowed(&self) -> u64 {
        self.inner.decisions_allowed.load(Ordering::Relaxed)
    }

    /// Total allowed-with-warning decisions.
    pub fn decisions_warned(&self) -> u64 {
        self.inner.decisions_warned.load(Ordering::Relaxed)
    }

    /// Total denied decisions.
    pub fn decisions_denied(&self) -> u64 {
        self.inner.decisions_denied.load(Ordering::Relaxed)
    }

    /// Total ledger entries removed by eviction.
    pub fn entries_swept(&self) -> u64 {
        self.inner.entries_swept.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            decisions_allowed: self.decisions_allowed(),
            decisions_warned: self.decisions_warned(),
            decisions_denied: self.decisions_denied(),
            entries_swept: self.entries_swept(),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.inner.decisions_allowed.store(0, Ordering::Relaxed);
        self.inner.decisions_warned.store(0, Ordering::Relaxed);
        self.inner.decisions_denied.store(0, Ordering::Relaxed);
        self.inner.entries_swept.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of throttle metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MetricsSnapshot {
    /// Total plain-allowed decisions
    pub decisions_allowed: u64,
    /// Total allowed-with-warning decisions
    pub decisions_warned: u64,
    /// Total denied decisions
    pub decisions_denied: u64,
    /// Total ledger entries removed by eviction
    pub entries_swept: u64,
}

impl MetricsSnapshot {
    /// Total checks processed (allowed + warned + denied).
    pub fn total_decisions(&self) -> u64 {
        self.decisions_allowed
            .saturating_add(self.decisions_warned)
            .saturating_add(self.decisions_denied)
    }

    /// Ratio of denied checks to total checks (0.0 to 1.0).
    ///
    /// Returns 0.0 if no checks have been processed.
    pub fn denial_rate(&self) -> f64 {
        let total = self.total_decisions();
        if total == 0 {
            0.0
        } else {
            self.decisions_denied as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.decisions_allowed(), 0);
        assert_eq!(metrics.decisions_warned(), 0);
        assert_eq!(metrics.decisions_denied(), 0);
        assert_eq!(metrics.entries_swept(), 0);
    }

    #[test]
    fn test_recording() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_allowed();
        metrics.record_warned();
        metrics.record_denied();
        metrics.record_swept(7);

        assert_eq!(metrics.decisions_allowed(), 2);
        assert_eq!(metrics.decisions_warned(), 1);
        assert_eq!(metrics.decisions_denied(), 1);
        assert_eq!(metrics.entries_swept(), 7);
    }

    #[test]
    fn test_snapshot_totals() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_warned();
        metrics.record_denied();
        metrics.record_denied();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_decisions(), 4);
        assert!((snapshot.denial_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_denial_rate_with_no_decisions() {
        assert_eq!(Metrics::new().snapshot().denial_rate(), 0.0);
    }

    #[test]
    fn test_clones_share_totals() {
        let metrics1 = Metrics::new();
        let metrics2 = metrics1.clone();

        metrics1.record_denied();
        metrics2.record_denied();

        assert_eq!(metrics1.decisions_denied(), 2);
        assert_eq!(metrics2.decisions_denied(), 2);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_swept(3);

        metrics.reset();
        assert_eq!(metrics.snapshot().total_decisions(), 0);
        assert_eq!(metrics.entries_swept(), 0);
    }
}
