//! Read-only per-category throttle snapshots.

use crate::application::breaker::CircuitState;
use crate::domain::category::ServiceCategory;
use std::collections::BTreeMap;

/// Point-in-time view of one category.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CategoryStats {
    /// Category the snapshot describes
    pub category: ServiceCategory,
    /// Accepted requests currently inside the burst window
    pub burst_count: usize,
    /// Burst window limit
    pub burst_limit: usize,
    /// Accepted requests currently inside the rate window
    pub rate_count: usize,
    /// Rate window limit
    pub rate_limit: usize,
    /// Breaker state at snapshot time
    pub breaker_state: CircuitState,
}

impl CategoryStats {
    /// Burst window utilization as a percentage (0.0 to 100.0).
    pub fn burst_utilization(&self) -> f64 {
        utilization(self.burst_count, self.burst_limit)
    }

    /// Rate window utilization as a percentage (0.0 to 100.0).
    pub fn rate_utilization(&self) -> f64 {
        utilization(self.rate_count, self.rate_limit)
    }
}

fn utilization(count: usize, limit: usize) -> f64 {
    if limit == 0 {
        0.0
    } else {
        count as f64 / limit as f64 * 100.0
    }
}

/// Snapshot across every category.
///
/// Produced by `RequestThrottle::stats`; covers the full category set, with
/// zero counts for categories that have never been queried.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThrottleStats {
    categories: BTreeMap<ServiceCategory, CategoryStats>,
}

impl ThrottleStats {
    pub(crate) fn new(categories: BTreeMap<ServiceCategory, CategoryStats>) -> Self {
        Self { categories }
    }

    /// Snapshot for one category.
    pub fn category(&self, category: ServiceCategory) -> Option<&CategoryStats> {
        self.categories.get(&category)
    }

    /// Iterate over all category snapshots, in category order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryStats> {
        self.categories.values()
    }

    /// Number of categories covered.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
