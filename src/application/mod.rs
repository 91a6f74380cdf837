//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Request throttle (decision making)
//! - Circuit breaker (per-category overload guard)
//! - Event notifier (decision fan-out)
//! - Metrics and per-category stats
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod breaker;
pub mod metrics;
pub mod notifier;
pub mod ports;
pub mod stats;
pub mod throttle;
