//! Per-category ledger of accepted-call timestamps.
//!
//! The ledger is an ordered record of the instants at which requests were
//! accepted for one category. Entries are appended in non-decreasing
//! timestamp order, so evicting stale entries is a head-trim: pop from the
//! front while the oldest entry has fallen out of the rate window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Ordered record of accepted-call timestamps for one category.
///
/// Append-only until eviction trims the head. Both the burst window and the
/// rate window are evaluated against the same ledger.
#[derive(Debug, Clone, Default)]
pub struct RequestLedger {
    timestamps: VecDeque<Instant>,
}

impl RequestLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            timestamps: VecDeque::new(),
        }
    }

    /// Record an accepted request at `now`.
    ///
    /// Callers must pass non-decreasing instants; the head-trim eviction
    /// relies on the queue staying sorted.
    pub fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Remove entries older than `window` relative to `now`.
    ///
    /// An entry exactly `window` old is kept: the boundary instant counts as
    /// inside the window. Returns the number of entries removed.
    pub fn evict_older_than(&mut self, now: Instant, window: Duration) -> usize {
        let mut evicted = 0;
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) > window {
                self.timestamps.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }
        evicted
    }

    /// Count entries within `window` relative to `now`, without mutating.
    ///
    /// Counts from the newest entry backwards and stops at the first entry
    /// outside the window, so the cost is bounded by the entries counted.
    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.timestamps
            .iter()
            .rev()
            .take_while(|&&t| now.saturating_duration_since(t) <= window)
            .count()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.timestamps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_len() {
        let mut ledger = RequestLedger::new();
        let now = Instant::now();

        assert!(ledger.is_empty());

        ledger.record(now);
        ledger.record(now + Duration::from_secs(1));

        assert_eq!(ledger.len(), 2);
        assert!(!ledger.is_empty());
    }

    #[test]
    fn test_evict_removes_only_stale_entries() {
        let mut ledger = RequestLedger::new();
        let start = Instant::now();

        ledger.record(start);
        ledger.record(start + Duration::from_secs(30));
        ledger.record(start + Duration::from_secs(59));

        let now = start + Duration::from_secs(61);
        let evicted = ledger.evict_older_than(now, Duration::from_secs(60));

        // Only the first entry (61s old) is outside the window
        assert_eq!(evicted, 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_boundary_entry_is_kept() {
        let mut ledger = RequestLedger::new();
        let start = Instant::now();
        let window = Duration::from_secs(60);

        ledger.record(start);

        // Exactly `window` old: elapsed <= window counts as within
        let evicted = ledger.evict_older_than(start + window, window);
        assert_eq!(evicted, 0);
        assert_eq!(ledger.len(), 1);

        // One nanosecond past the boundary: gone
        let evicted = ledger.evict_older_than(start + window + Duration::from_nanos(1), window);
        assert_eq!(evicted, 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_count_within_does_not_mutate() {
        let mut ledger = RequestLedger::new();
        let start = Instant::now();

        ledger.record(start);
        ledger.record(start + Duration::from_secs(55));

        let now = start + Duration::from_secs(60);
        assert_eq!(ledger.count_within(now, Duration::from_secs(10)), 1);
        assert_eq!(ledger.count_within(now, Duration::from_secs(60)), 2);

        // Counting never evicts
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_count_within_inclusive_boundary() {
        let mut ledger = RequestLedger::new();
        let start = Instant::now();

        ledger.record(start);

        assert_eq!(ledger.count_within(start + Duration::from_secs(10), Duration::from_secs(10)), 1);
    }

    #[test]
    fn test_clear() {
        let mut ledger = RequestLedger::new();
        ledger.record(Instant::now());
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_evict_everything() {
        let mut ledger = RequestLedger::new();
        let start = Instant::now();

        for i in 0..10 {
            ledger.record(start + Duration::from_secs(i));
        }

        let now = start + Duration::from_secs(1000);
        let evicted = ledger.evict_older_than(now, Duration::from_secs(60));

        assert_eq!(evicted, 10);
        assert!(ledger.is_empty());
    }
}
