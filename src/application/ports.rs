//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::Instant;

/// Port for obtaining current time.
///
/// Every decision the throttle makes is a function of "now"; routing time
/// through this port lets tests drive windows and cooldowns deterministically
/// with a mock clock. Infrastructure provides the concrete implementations
/// (`SystemClock`, `MockClock`).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}
