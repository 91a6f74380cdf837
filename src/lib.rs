//! # request-throttle
//!
//! Client-side request throttling and circuit breaking for outbound backend
//! service calls.
//!
//! This crate guards a process's own traffic to its backend: before issuing
//! a call, ask the throttle whether the call's [`ServiceCategory`] still has
//! headroom. The throttle tracks accepted-call timestamps per category,
//! enforces a short burst window and a longer rate window against the same
//! ledger, and trips a per-category circuit breaker when the rate window
//! fills. The caller performs or skips the guarded operation itself; the
//! throttle only decides.
//!
//! ## Quick Start
//!
//! ```rust
//! use request_throttle::{RequestThrottle, ServiceCategory};
//!
//! // Construct once at the composition root, share via Arc.
//! let throttle = RequestThrottle::new();
//!
//! let decision = throttle.check_request(ServiceCategory::BulkRead);
//! if decision.is_allowed() {
//!     // issue the backend call
//! } else {
//!     // skip it; decision.reason says why and decision.limit
//!     // / decision.observed_count inform any retry policy
//! }
//! ```
//!
//! Or customize limits, clock, and breaker:
//!
//! ```rust
//! use request_throttle::{
//!     CircuitBreakerConfig, RateLimitConfig, RequestThrottle, ServiceCategory,
//! };
//! use std::time::Duration;
//!
//! let throttle = RequestThrottle::builder()
//!     .with_limit(
//!         ServiceCategory::Telemetry,
//!         RateLimitConfig::with_limits(50, 500).unwrap(),
//!     )
//!     .with_breaker_config(CircuitBreakerConfig {
//!         cooldown: Duration::from_secs(120),
//!     })
//!     .build()
//!     .unwrap();
//! # let _ = throttle;
//! ```
//!
//! ## Verdicts
//!
//! Every check returns (and publishes) a [`ThrottleDecision`]:
//!
//! - `Allowed` - both windows comfortably under their limits
//! - `AllowedWithWarning` - accepted, but a window crossed 80% utilization
//! - `Denied` - breaker open, burst window full, or rate window full
//! - `ConfigChanged` - not a check outcome; emitted by reconfiguration,
//!   breaker resets, and history clears
//!
//! Denials are normal outcomes, not errors: check the verdict rather than
//! expecting anything to be thrown. The throttle performs no retries; retry
//! policy belongs to the caller, informed by the decision's `reason`,
//! `observed_count`, and `limit` fields.
//!
//! ## Circuit breaker lifecycle
//!
//! A category's breaker trips open when its rate window fills (burst
//! overflow alone never trips it). While open, every check is denied without
//! consulting the ledger. After a fixed cooldown the breaker is half-open,
//! and the next request that passes both window checks closes it; a
//! violation while half-open trips it afresh. `reset_circuit_breaker` forces
//! it closed at any time. State is computed lazily from the trip instant, so
//! there is no background timer to race against a manual reset.
//!
//! ## Listeners
//!
//! Monitoring code subscribes to the decision stream:
//!
//! ```rust
//! use request_throttle::{FnListener, RequestThrottle, ServiceCategory, ThrottleDecision};
//! use std::sync::Arc;
//!
//! let throttle = RequestThrottle::new();
//! throttle.subscribe(Arc::new(FnListener::new(|decision: &ThrottleDecision| {
//!     if decision.is_denied() {
//!         eprintln!("{}: {}", decision.category, decision.reason);
//!     }
//! })));
//!
//! throttle.check_request(ServiceCategory::Authentication);
//! ```
//!
//! Listeners are called synchronously in registration order; a panicking
//! listener is logged and skipped without affecting the others or the
//! caller.
//!
//! ## Memory
//!
//! Each category holds at most one rate window of timestamps once evicted;
//! the check path evicts per call, and the optional [`PeriodicSweeper`]
//! (feature `async`, on by default) evicts for categories that have gone
//! idle:
//!
//! ```rust,no_run
//! # #[cfg(feature = "async")]
//! # async fn demo() {
//! use request_throttle::{PeriodicSweeper, RequestThrottle, SweeperConfig};
//! use std::sync::Arc;
//!
//! let throttle = Arc::new(RequestThrottle::new());
//! let handle = PeriodicSweeper::new(Arc::clone(&throttle), SweeperConfig::default()).start();
//!
//! // ... on teardown:
//! handle.shutdown();
//! # }
//! ```
//!
//! ## Observability
//!
//! [`RequestThrottle::stats`] returns a read-only per-category snapshot
//! (window counts, limits, utilization percentages, breaker state) that
//! always matches a fresh recount of the ledgers. Cumulative totals are
//! available through [`RequestThrottle::metrics`]. Internally the crate
//! emits `tracing` events: denials and sweeps at debug level, breaker trips
//! at warn.
//!
//! All state is in-memory and lost on process restart: the throttle is
//! advisory protection for the current session, not a durable quota ledger.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    category::ServiceCategory,
    decision::{DecisionContext, DecisionReason, ThrottleDecision, Verdict},
    ledger::RequestLedger,
    limits::{ConfigError, RateLimitConfig},
};

pub use application::{
    breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState},
    metrics::{Metrics, MetricsSnapshot},
    notifier::{DecisionListener, EventNotifier, FnListener},
    stats::{CategoryStats, ThrottleStats},
    throttle::{BuildError, RequestThrottle, RequestThrottleBuilder},
};

pub use infrastructure::clock::SystemClock;

#[cfg(feature = "async")]
pub use infrastructure::sweeper::{
    PeriodicSweeper, SweeperConfig, SweeperConfigError, SweeperHandle,
};
