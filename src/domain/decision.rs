//! Throttle decision values delivered to callers and listeners.

use crate::domain::category::ServiceCategory;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Opaque key/value context attached to a decision.
///
/// Passed through untouched for downstream logging; the throttle core never
/// inspects it.
pub type DecisionContext = BTreeMap<Cow<'static, str>, Cow<'static, str>>;

/// Outcome of one throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Verdict {
    /// Proceed with the guarded call
    Allowed,
    /// Proceed, but utilization crossed the warning threshold
    AllowedWithWarning,
    /// Skip the guarded call
    Denied,
    /// Not a check outcome: configuration or state was changed explicitly
    ConfigChanged,
}

impl Verdict {
    /// Whether the guarded call may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed | Verdict::AllowedWithWarning)
    }

    /// Whether the guarded call must be skipped.
    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Denied)
    }
}

/// Machine-readable explanation for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DecisionReason {
    /// Both windows comfortably under their limits
    WithinLimits,
    /// Burst count reached 80% of the burst limit
    ApproachingBurstLimit,
    /// Rate count reached 80% of the rate limit
    ApproachingRateLimit,
    /// Burst window is full
    BurstLimitExceeded,
    /// Rate window is full; the breaker has tripped
    RateLimitExceeded,
    /// Breaker is open; the ledger was not consulted
    CircuitBreakerOpen,
    /// `update_rate_limit` replaced the category's rate limit
    RateLimitUpdated,
    /// `reset_circuit_breaker` forced the breaker closed
    BreakerReset,
    /// `clear_history` emptied this category's state
    HistoryCleared,
}

impl DecisionReason {
    /// Stable name for logging and event context.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::WithinLimits => "within-limits",
            DecisionReason::ApproachingBurstLimit => "approaching-burst-limit",
            DecisionReason::ApproachingRateLimit => "approaching-rate-limit",
            DecisionReason::BurstLimitExceeded => "burst-limit-exceeded",
            DecisionReason::RateLimitExceeded => "rate-limit-exceeded",
            DecisionReason::CircuitBreakerOpen => "circuit-breaker-open",
            DecisionReason::RateLimitUpdated => "rate-limit-updated",
            DecisionReason::BreakerReset => "breaker-reset",
            DecisionReason::HistoryCleared => "history-cleared",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one throttle outcome.
///
/// Returned from every check and delivered to every subscribed listener.
/// `observed_count` and `limit` describe whichever window produced the
/// verdict, so callers can build their own retry policy from them.
#[derive(Debug, Clone)]
pub struct ThrottleDecision {
    /// Category the check was made against
    pub category: ServiceCategory,
    /// Outcome
    pub verdict: Verdict,
    /// Why
    pub reason: DecisionReason,
    /// Count observed in the window that decided the verdict
    pub observed_count: usize,
    /// Limit of the window that decided the verdict
    pub limit: usize,
    /// When the decision was made
    pub timestamp: Instant,
    /// Optional free-form label for the guarded operation
    pub operation: Option<Cow<'static, str>>,
    /// Opaque caller-supplied context, plus any old/new values for
    /// configuration changes
    pub context: DecisionContext,
}

impl ThrottleDecision {
    /// Whether the guarded call may proceed.
    pub fn is_allowed(&self) -> bool {
        self.verdict.is_allowed()
    }

    /// Whether the guarded call must be skipped.
    pub fn is_denied(&self) -> bool {
        self.verdict.is_denied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_helpers() {
        assert!(Verdict::Allowed.is_allowed());
        assert!(Verdict::AllowedWithWarning.is_allowed());
        assert!(!Verdict::Denied.is_allowed());
        assert!(Verdict::Denied.is_denied());
        assert!(!Verdict::ConfigChanged.is_allowed());
        assert!(!Verdict::ConfigChanged.is_denied());
    }

    #[test]
    fn test_reason_names_are_unique() {
        let reasons = [
            DecisionReason::WithinLimits,
            DecisionReason::ApproachingBurstLimit,
            DecisionReason::ApproachingRateLimit,
            DecisionReason::BurstLimitExceeded,
            DecisionReason::RateLimitExceeded,
            DecisionReason::CircuitBreakerOpen,
            DecisionReason::RateLimitUpdated,
            DecisionReason::BreakerReset,
            DecisionReason::HistoryCleared,
        ];

        let mut names: Vec<_> = reasons.iter().map(|r| r.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), reasons.len());
    }

    #[test]
    fn test_decision_helpers() {
        let decision = ThrottleDecision {
            category: ServiceCategory::Telemetry,
            verdict: Verdict::Denied,
            reason: DecisionReason::BurstLimitExceeded,
            observed_count: 20,
            limit: 20,
            timestamp: Instant::now(),
            operation: Some(Cow::Borrowed("log_event")),
            context: DecisionContext::new(),
        };

        assert!(decision.is_denied());
        assert!(!decision.is_allowed());
    }
}
