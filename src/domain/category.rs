//! Service categories for guarded operations.
//!
//! A category groups outbound calls that share one set of limits: all
//! authentication traffic is throttled together, all bulk reads together,
//! and so on. The set is closed and known at startup.

use std::fmt;

/// Logical class of guarded backend operation.
///
/// Each category has its own ledger, limits, and breaker state. Categories
/// are independent: exhausting one never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ServiceCategory {
    /// Sign-in, sign-up, token refresh.
    Authentication,
    /// High-volume read operations (queries, listing, fetch-many).
    BulkRead,
    /// High-volume write operations (batch updates, uploads).
    BulkWrite,
    /// Analytics and crash reporting traffic.
    Telemetry,
}

impl ServiceCategory {
    /// Every category, in declaration order.
    ///
    /// `clear_history` and `stats` walk this set so that categories which
    /// were never queried are still covered.
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Authentication,
        ServiceCategory::BulkRead,
        ServiceCategory::BulkWrite,
        ServiceCategory::Telemetry,
    ];

    /// Stable name for logging and event context.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Authentication => "authentication",
            ServiceCategory::BulkRead => "bulk-read",
            ServiceCategory::BulkWrite => "bulk-write",
            ServiceCategory::Telemetry => "telemetry",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
