//! Per-category circuit breaker.
//!
//! When a category's rate window fills up, its breaker trips open and every
//! subsequent request is denied without consulting the ledger. After a fixed
//! cooldown the breaker is half-open: the next request that passes both
//! window checks closes it again.
//!
//! There is no deferred cooldown callback. Each category stores only the
//! instant it last tripped; the state is computed from that instant and the
//! current time on every access. A manual reset clears the instant, so a
//! reset can never be undone by a stale timer.

use crate::domain::category::ServiceCategory;
use ahash::RandomState;
use dashmap::DashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CircuitState {
    /// Operating normally
    Closed,
    /// Blocking all requests for the category
    Open,
    /// Cooldown elapsed; the next clean request closes the breaker
    HalfOpen,
}

impl CircuitState {
    /// Stable name for logging and stats.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// How long a tripped breaker blocks before turning half-open
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(300),
        }
    }
}

/// Per-category trip record. Absent or `None` means closed.
#[derive(Debug, Clone, Copy, Default)]
struct BreakerSlot {
    tripped_at: Option<Instant>,
}

/// Tri-state breaker keyed by service category.
///
/// All state transitions are driven by the callers passing in "now", so a
/// mock clock controls cooldowns the same way it controls the windows.
#[derive(Debug)]
pub struct CircuitBreaker {
    slots: DashMap<ServiceCategory, BreakerSlot, RandomState>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a breaker with the default cooldown.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a breaker with a custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            slots: DashMap::with_hasher(RandomState::new()),
            config,
        }
    }

    /// Current state for a category at `now`.
    ///
    /// Pure function of the stored trip instant: open while the cooldown is
    /// running, half-open once it has elapsed, closed otherwise. Never
    /// mutates, so it is safe to call from read-only stats queries.
    pub fn state(&self, category: ServiceCategory, now: Instant) -> CircuitState {
        match self.slots.get(&category).and_then(|slot| slot.tripped_at) {
            None => CircuitState::Closed,
            Some(tripped_at) => {
                if now.saturating_duration_since(tripped_at) < self.config.cooldown {
                    CircuitState::Open
                } else {
                    CircuitState::HalfOpen
                }
            }
        }
    }

    /// Trip the breaker for a category, arming a fresh cooldown.
    ///
    /// Called on a rate-limit violation. A violation observed while
    /// half-open lands here too and simply re-arms the cooldown.
    pub fn trip(&self, category: ServiceCategory, now: Instant) {
        self.slots.entry(category).or_default().tripped_at = Some(now);
    }

    /// Record a request that passed every check.
    ///
    /// Closes the breaker if it was half-open; a no-op in any other state.
    pub fn observe_clean(&self, category: ServiceCategory, now: Instant) {
        if let Some(mut slot) = self.slots.get_mut(&category) {
            if let Some(tripped_at) = slot.tripped_at {
                if now.saturating_duration_since(tripped_at) >= self.config.cooldown {
                    slot.tripped_at = None;
                }
            }
        }
    }

    /// Force a category's breaker back to closed, whatever its state.
    pub fn reset(&self, category: ServiceCategory) {
        if let Some(mut slot) = self.slots.get_mut(&category) {
            slot.tripped_at = None;
        }
    }

    /// Reset every category.
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Get the breaker configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
