//! Decision-recording listener for testing.

use crate::application::notifier::DecisionListener;
use crate::domain::decision::ThrottleDecision;
use std::sync::{Arc, Mutex};

/// Listener that records every decision it receives.
///
/// Clones share the same underlying buffer, so one clone can be subscribed
/// while another asserts on what was delivered.
#[derive(Clone, Default)]
pub struct RecordingListener {
    decisions: Arc<Mutex<Vec<ThrottleDecision>>>,
}

impl RecordingListener {
    /// Create a listener with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded decisions.
    pub fn decisions(&self) -> Vec<ThrottleDecision> {
        self.decisions
            .lock()
            .expect("RecordingListener mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Get the count of recorded decisions.
    pub fn count(&self) -> usize {
        self.decisions
            .lock()
            .expect("RecordingListener mutex poisoned - a test thread panicked while holding the lock")
            .len()
    }

    /// Get the most recently recorded decision, if any.
    pub fn last(&self) -> Option<ThrottleDecision> {
        self.decisions
            .lock()
            .expect("RecordingListener mutex poisoned - a test thread panicked while holding the lock")
            .last()
            .cloned()
    }

    /// Drop all recorded decisions.
    pub fn clear(&self) {
        self.decisions
            .lock()
            .expect("RecordingListener mutex poisoned - a test thread panicked while holding the lock")
            .clear();
    }
}

impl DecisionListener for RecordingListener {
    fn on_decision(&self, decision: &ThrottleDecision) {
        self.decisions
            .lock()
            .expect("RecordingListener mutex poisoned - a test thread panicked while holding the lock")
            .push(decision.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::ServiceCategory;
    use crate::domain::decision::{DecisionContext, DecisionReason, Verdict};
    use std::time::Instant;

    #[test]
    fn test_records_decisions() {
        let listener = RecordingListener::new();
        let decision = ThrottleDecision {
            category: ServiceCategory::Authentication,
            verdict: Verdict::Allowed,
            reason: DecisionReason::WithinLimits,
            observed_count: 1,
            limit: 30,
            timestamp: Instant::now(),
            operation: None,
            context: DecisionContext::new(),
        };

        listener.on_decision(&decision);
        listener.on_decision(&decision);

        assert_eq!(listener.count(), 2);
        assert_eq!(
            listener.last().unwrap().category,
            ServiceCategory::Authentication
        );

        listener.clear();
        assert_eq!(listener.count(), 0);
        assert!(listener.last().is_none());
    }
}
