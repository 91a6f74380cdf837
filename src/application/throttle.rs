//! Request throttle coordination logic.
//!
//! The throttle decides whether a guarded call for a service category may
//! proceed right now, records accepted calls in the category's ledger, and
//! publishes every decision to registered listeners. The caller is solely
//! responsible for actually performing or skipping the guarded operation.

use crate::application::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::application::metrics::Metrics;
use crate::application::notifier::{DecisionListener, EventNotifier};
use crate::application::ports::Clock;
use crate::application::stats::{CategoryStats, ThrottleStats};
use crate::domain::category::ServiceCategory;
use crate::domain::decision::{DecisionContext, DecisionReason, ThrottleDecision, Verdict};
use crate::domain::ledger::RequestLedger;
use crate::domain::limits::{ConfigError, RateLimitConfig};
use crate::infrastructure::clock::SystemClock;

use ahash::RandomState;
use dashmap::DashMap;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Utilization percentage at which an allowed request carries a warning.
const WARN_THRESHOLD_PCT: usize = 80;

/// Error returned when building a `RequestThrottle` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Breaker cooldown must be greater than zero
    ZeroCooldown,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ZeroCooldown => {
                write!(f, "breaker cooldown must be greater than 0")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder for constructing a [`RequestThrottle`].
pub struct RequestThrottleBuilder {
    limits: BTreeMap<ServiceCategory, RateLimitConfig>,
    clock: Option<Arc<dyn Clock>>,
    breaker_config: CircuitBreakerConfig,
}

impl RequestThrottleBuilder {
    fn new() -> Self {
        Self {
            limits: BTreeMap::new(),
            clock: None,
            breaker_config: CircuitBreakerConfig::default(),
        }
    }

    /// Override the limits for one category.
    ///
    /// Categories without an override keep their built-in defaults.
    pub fn with_limit(mut self, category: ServiceCategory, config: RateLimitConfig) -> Self {
        self.limits.insert(category, config);
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the circuit breaker configuration.
    ///
    /// The cooldown will be validated when `build()` is called.
    pub fn with_breaker_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = config;
        self
    }

    /// Build the throttle.
    ///
    /// # Errors
    /// Returns `BuildError::ZeroCooldown` if the breaker cooldown is zero.
    pub fn build(self) -> Result<RequestThrottle, BuildError> {
        if self.breaker_config.cooldown.is_zero() {
            return Err(BuildError::ZeroCooldown);
        }

        let limits: DashMap<ServiceCategory, RateLimitConfig, RandomState> =
            DashMap::with_hasher(RandomState::new());
        for category in ServiceCategory::ALL {
            let config = self
                .limits
                .get(&category)
                .copied()
                .unwrap_or_else(|| RateLimitConfig::default_for(category));
            limits.insert(category, config);
        }

        Ok(RequestThrottle {
            ledgers: DashMap::with_hasher(RandomState::new()),
            limits,
            breaker: CircuitBreaker::with_config(self.breaker_config),
            notifier: EventNotifier::new(),
            metrics: Metrics::new(),
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new())),
        })
    }
}

/// Throttle guarding outbound calls per service category.
///
/// One instance serves the whole process: the composition root constructs it
/// once and hands an `Arc` to every collaborator that issues guarded calls.
/// All state is in-memory and lost on restart; the throttle is advisory
/// protection for the current session, not a durable quota ledger.
pub struct RequestThrottle {
    /// Accepted-call timestamps, one ledger per category, created lazily
    ledgers: DashMap<ServiceCategory, RequestLedger, RandomState>,
    /// Active limits, populated for every category at construction
    limits: DashMap<ServiceCategory, RateLimitConfig, RandomState>,
    breaker: CircuitBreaker,
    notifier: EventNotifier,
    metrics: Metrics,
    clock: Arc<dyn Clock>,
}

impl RequestThrottle {
    /// Create a throttle with default limits, breaker, and system clock.
    pub fn new() -> Self {
        RequestThrottleBuilder::new()
            .build()
            .expect("default configuration is valid")
    }

    /// Start building a customized throttle.
    pub fn builder() -> RequestThrottleBuilder {
        RequestThrottleBuilder::new()
    }

    /// Ask whether a call for `category` may proceed now.
    ///
    /// Never blocks; completes synchronously. On an allowed verdict the
    /// current instant is appended to the category's ledger. Exactly one
    /// decision event is published to all listeners, whatever the verdict.
    pub fn check_request(&self, category: ServiceCategory) -> ThrottleDecision {
        self.check_request_with_context(category, None, DecisionContext::new())
    }

    /// Like [`check_request`](Self::check_request), with an operation label
    /// and a caller-supplied context map passed through into the decision.
    pub fn check_request_with_context(
        &self,
        category: ServiceCategory,
        operation: Option<Cow<'static, str>>,
        context: DecisionContext,
    ) -> ThrottleDecision {
        let now = self.clock.now();
        let limits = self.limit_for(category);

        trace!(category = %category, "checking request");

        // The entry guard makes the evict-check-append sequence atomic per
        // category. It must be released before the decision is published so
        // listeners can call back into the throttle.
        let (verdict, reason, observed_count, limit) = {
            let mut ledger = self
                .ledgers
                .entry(category)
                .or_insert_with(RequestLedger::new);

            let evicted = ledger.evict_older_than(now, limits.rate_window);
            if evicted > 0 {
                self.metrics.record_swept(evicted);
            }

            if self.breaker.state(category, now) == CircuitState::Open {
                (
                    Verdict::Denied,
                    DecisionReason::CircuitBreakerOpen,
                    ledger.len(),
                    limits.rate_limit,
                )
            } else {
                let burst_count = ledger.count_within(now, limits.burst_window);
                if burst_count >= limits.burst_limit {
                    // Burst overflow alone never trips the breaker
                    (
                        Verdict::Denied,
                        DecisionReason::BurstLimitExceeded,
                        burst_count,
                        limits.burst_limit,
                    )
                } else if ledger.len() >= limits.rate_limit {
                    self.breaker.trip(category, now);
                    warn!(
                        category = %category,
                        rate_count = ledger.len(),
                        rate_limit = limits.rate_limit,
                        "rate limit exceeded; circuit breaker tripped"
                    );
                    (
                        Verdict::Denied,
                        DecisionReason::RateLimitExceeded,
                        ledger.len(),
                        limits.rate_limit,
                    )
                } else {
                    ledger.record(now);
                    self.breaker.observe_clean(category, now);

                    let rate_count = ledger.len();
                    let burst_count = burst_count + 1;
                    if rate_count * 100 >= limits.rate_limit * WARN_THRESHOLD_PCT {
                        (
                            Verdict::AllowedWithWarning,
                            DecisionReason::ApproachingRateLimit,
                            rate_count,
                            limits.rate_limit,
                        )
                    } else if burst_count * 100 >= limits.burst_limit * WARN_THRESHOLD_PCT {
                        (
                            Verdict::AllowedWithWarning,
                            DecisionReason::ApproachingBurstLimit,
                            burst_count,
                            limits.burst_limit,
                        )
                    } else {
                        (
                            Verdict::Allowed,
                            DecisionReason::WithinLimits,
                            rate_count,
                            limits.rate_limit,
                        )
                    }
                }
            }
        };

        match verdict {
            Verdict::Allowed => self.metrics.record_allowed(),
            Verdict::AllowedWithWarning => self.metrics.record_warned(),
            Verdict::Denied => {
                self.metrics.record_denied();
                debug!(
                    category = %category,
                    reason = %reason,
                    observed_count,
                    limit,
                    "request denied"
                );
            }
            Verdict::ConfigChanged => {}
        }

        let decision = ThrottleDecision {
            category,
            verdict,
            reason,
            observed_count,
            limit,
            timestamp: now,
            operation,
            context,
        };
        self.notifier.publish(&decision);
        decision
    }

    /// Replace the rate limit for one category.
    ///
    /// Past decisions are not re-evaluated; entries already in the ledger
    /// stay and count against the new limit. Publishes a config-changed
    /// event carrying the old and new limits in its context.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroRateLimit` if `new_rate_limit` is zero; the
    /// active configuration is left untouched.
    pub fn update_rate_limit(
        &self,
        category: ServiceCategory,
        new_rate_limit: usize,
    ) -> Result<(), ConfigError> {
        if new_rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }

        let now = self.clock.now();
        let old_rate_limit = {
            let mut config = self
                .limits
                .get_mut(&category)
                .expect("limits map covers every category");
            let old = config.rate_limit;
            config.rate_limit = new_rate_limit;
            old
        };

        debug!(
            category = %category,
            old_rate_limit,
            new_rate_limit,
            "rate limit updated"
        );

        let mut context = DecisionContext::new();
        context.insert(
            Cow::Borrowed("old_limit"),
            Cow::Owned(old_rate_limit.to_string()),
        );
        context.insert(
            Cow::Borrowed("new_limit"),
            Cow::Owned(new_rate_limit.to_string()),
        );
        self.publish_config_event(
            category,
            DecisionReason::RateLimitUpdated,
            new_rate_limit,
            now,
            context,
        );
        Ok(())
    }

    /// Force a category's breaker back to closed, whatever its state.
    ///
    /// Publishes a config-changed event. The next check for the category
    /// goes through the normal ledger checks again.
    pub fn reset_circuit_breaker(&self, category: ServiceCategory) {
        let now = self.clock.now();
        self.breaker.reset(category);

        debug!(category = %category, "circuit breaker reset");

        let rate_limit = self.limit_for(category).rate_limit;
        self.publish_config_event(
            category,
            DecisionReason::BreakerReset,
            rate_limit,
            now,
            DecisionContext::new(),
        );
    }

    /// Empty every ledger and reset every breaker.
    ///
    /// Publishes one config-changed event per category. Intended for test
    /// isolation or emergency recovery, not normal operation.
    pub fn clear_history(&self) {
        let now = self.clock.now();
        self.ledgers.clear();
        self.breaker.clear();

        debug!("throttle history cleared");

        for category in ServiceCategory::ALL {
            let rate_limit = self.limit_for(category).rate_limit;
            self.publish_config_event(
                category,
                DecisionReason::HistoryCleared,
                rate_limit,
                now,
                DecisionContext::new(),
            );
        }
    }

    /// Read-only snapshot across every category.
    ///
    /// Pure query: counts are taken by filtering each ledger to its windows
    /// without evicting, and the breaker state is computed without being
    /// touched. Categories never queried report zero counts.
    pub fn stats(&self) -> ThrottleStats {
        let now = self.clock.now();
        let mut categories = BTreeMap::new();

        for category in ServiceCategory::ALL {
            let limits = self.limit_for(category);
            let (burst_count, rate_count) = match self.ledgers.get(&category) {
                Some(ledger) => (
                    ledger.count_within(now, limits.burst_window),
                    ledger.count_within(now, limits.rate_window),
                ),
                None => (0, 0),
            };

            categories.insert(
                category,
                CategoryStats {
                    category,
                    burst_count,
                    burst_limit: limits.burst_limit,
                    rate_count,
                    rate_limit: limits.rate_limit,
                    breaker_state: self.breaker.state(category, now),
                },
            );
        }

        ThrottleStats::new(categories)
    }

    /// Evict stale entries from every ledger.
    ///
    /// The same head-trim the check path applies per call, run across all
    /// categories so ledgers for idle categories stop holding memory.
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;

        for mut entry in self.ledgers.iter_mut() {
            let window = self.limit_for(*entry.key()).rate_window;
            evicted += entry.value_mut().evict_older_than(now, window);
        }

        if evicted > 0 {
            self.metrics.record_swept(evicted);
            debug!(evicted, "sweep evicted stale ledger entries");
        }
        evicted
    }

    /// Register a decision listener. Idempotent.
    pub fn subscribe(&self, listener: Arc<dyn DecisionListener>) {
        self.notifier.subscribe(listener);
    }

    /// Remove a decision listener. No-op if not subscribed.
    pub fn unsubscribe(&self, listener: &Arc<dyn DecisionListener>) {
        self.notifier.unsubscribe(listener);
    }

    /// Active limits for a category.
    pub fn limit_for(&self, category: ServiceCategory) -> RateLimitConfig {
        *self
            .limits
            .get(&category)
            .expect("limits map covers every category")
    }

    /// Get a reference to the cumulative metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get a reference to the event notifier.
    pub fn notifier(&self) -> &EventNotifier {
        &self.notifier
    }

    fn publish_config_event(
        &self,
        category: ServiceCategory,
        reason: DecisionReason,
        limit: usize,
        now: Instant,
        context: DecisionContext,
    ) {
        let observed_count = self
            .ledgers
            .get(&category)
            .map(|ledger| ledger.len())
            .unwrap_or(0);

        let decision = ThrottleDecision {
            category,
            verdict: Verdict::ConfigChanged,
            reason,
            observed_count,
            limit,
            timestamp: now,
            operation: None,
            context,
        };
        self.notifier.publish(&decision);
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("categories", &self.ledgers.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}
