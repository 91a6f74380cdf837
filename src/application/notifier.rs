//! Decision event fan-out.
//!
//! Every throttle decision is delivered synchronously to all subscribed
//! listeners, in registration order. A listener is anything that can receive
//! a [`ThrottleDecision`]; there is no base class to inherit from, and plain
//! closures subscribe through the [`FnListener`] adapter.

use crate::domain::decision::ThrottleDecision;
use std::panic;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Capability of receiving throttle decisions.
pub trait DecisionListener: Send + Sync {
    /// Called once per published decision.
    fn on_decision(&self, decision: &ThrottleDecision);
}

/// Adapter turning a plain closure into a [`DecisionListener`].
///
/// ```
/// use request_throttle::{FnListener, ThrottleDecision};
/// use std::sync::Arc;
///
/// let listener = Arc::new(FnListener::new(|decision: &ThrottleDecision| {
///     println!("{}: {}", decision.category, decision.reason);
/// }));
/// # let _ = listener;
/// ```
pub struct FnListener<F>(F);

impl<F> FnListener<F>
where
    F: Fn(&ThrottleDecision) + Send + Sync,
{
    /// Wrap a closure as a listener.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> DecisionListener for FnListener<F>
where
    F: Fn(&ThrottleDecision) + Send + Sync,
{
    fn on_decision(&self, decision: &ThrottleDecision) {
        (self.0)(decision)
    }
}

/// Fan-out of decisions to registered listeners.
///
/// Listener membership is caller-managed. Subscribing the same listener
/// handle twice has no additional effect, and unsubscribing an unknown
/// handle is a no-op. Publication iterates a snapshot of the set, so a
/// listener may subscribe or unsubscribe listeners (itself included) while
/// being notified.
#[derive(Default)]
pub struct EventNotifier {
    listeners: Mutex<Vec<Arc<dyn DecisionListener>>>,
}

impl EventNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener. Idempotent: the same handle is held once.
    ///
    /// Identity is the `Arc` allocation, so two clones of one `Arc` count as
    /// the same listener while two separate `Arc`s of equal closures do not.
    pub fn subscribe(&self, listener: Arc<dyn DecisionListener>) {
        let mut listeners = self
            .listeners
            .lock()
            .expect("listener set mutex poisoned - a thread panicked while holding the lock");
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove a listener. No-op if it was never subscribed.
    pub fn unsubscribe(&self, listener: &Arc<dyn DecisionListener>) {
        let mut listeners = self
            .listeners
            .lock()
            .expect("listener set mutex poisoned - a thread panicked while holding the lock");
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("listener set mutex poisoned - a thread panicked while holding the lock")
            .len()
    }

    /// Deliver a decision to every listener, in registration order.
    ///
    /// A panicking listener is logged and skipped; it cannot prevent the
    /// remaining listeners from being notified or unwind into the caller of
    /// `check_request`. The set is snapshotted before iteration and the lock
    /// released, so listeners may mutate subscriptions during delivery.
    pub fn publish(&self, decision: &ThrottleDecision) {
        let snapshot: Vec<Arc<dyn DecisionListener>> = self
            .listeners
            .lock()
            .expect("listener set mutex poisoned - a thread panicked while holding the lock")
            .clone();

        for listener in snapshot {
            let result =
                panic::catch_unwind(panic::AssertUnwindSafe(|| listener.on_decision(decision)));
            if result.is_err() {
                warn!(
                    category = %decision.category,
                    reason = %decision.reason,
                    "throttle decision listener panicked; continuing with remaining listeners"
                );
            }
        }
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::ServiceCategory;
    use crate::domain::decision::{DecisionContext, DecisionReason, Verdict};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn decision() -> ThrottleDecision {
        ThrottleDecision {
            category: ServiceCategory::Telemetry,
            verdict: Verdict::Allowed,
            reason: DecisionReason::WithinLimits,
            observed_count: 1,
            limit: 200,
            timestamp: Instant::now(),
            operation: None,
            context: DecisionContext::new(),
        }
    }

    #[test]
    fn test_publish_reaches_all_listeners() {
        let notifier = EventNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            notifier.subscribe(Arc::new(FnListener::new(move |_: &ThrottleDecision| {
                hits.fetch_add(1, Ordering::SeqCst);
            })));
        }

        notifier.publish(&decision());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let notifier = EventNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let listener: Arc<dyn DecisionListener> =
            Arc::new(FnListener::new(move |_: &ThrottleDecision| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }));

        notifier.subscribe(Arc::clone(&listener));
        notifier.subscribe(Arc::clone(&listener));
        assert_eq!(notifier.listener_count(), 1);

        notifier.publish(&decision());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let notifier = EventNotifier::new();
        let listener: Arc<dyn DecisionListener> =
            Arc::new(FnListener::new(|_: &ThrottleDecision| {}));

        notifier.unsubscribe(&listener);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribed_listener_not_notified() {
        let notifier = EventNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let listener: Arc<dyn DecisionListener> =
            Arc::new(FnListener::new(move |_: &ThrottleDecision| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }));

        notifier.subscribe(Arc::clone(&listener));
        notifier.unsubscribe(&listener);

        notifier.publish(&decision());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let notifier = EventNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        notifier.subscribe(Arc::new(FnListener::new(|_: &ThrottleDecision| {
            panic!("listener bug");
        })));

        let hits_clone = Arc::clone(&hits);
        notifier.subscribe(Arc::new(FnListener::new(move |_: &ThrottleDecision| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        })));

        // Must not unwind into the publisher
        notifier.publish(&decision());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself_during_delivery() {
        struct SelfRemoving {
            notifier: Arc<EventNotifier>,
            me: Mutex<Option<Arc<dyn DecisionListener>>>,
        }

        impl DecisionListener for SelfRemoving {
            fn on_decision(&self, _decision: &ThrottleDecision) {
                if let Some(me) = self
                    .me
                    .lock()
                    .expect("test mutex poisoned")
                    .take()
                {
                    self.notifier.unsubscribe(&me);
                }
            }
        }

        let notifier = Arc::new(EventNotifier::new());
        let listener = Arc::new(SelfRemoving {
            notifier: Arc::clone(&notifier),
            me: Mutex::new(None),
        });
        let handle: Arc<dyn DecisionListener> = listener.clone();
        *listener.me.lock().expect("test mutex poisoned") = Some(Arc::clone(&handle));

        notifier.subscribe(handle);
        assert_eq!(notifier.listener_count(), 1);

        notifier.publish(&decision());
        assert_eq!(notifier.listener_count(), 0);

        // A second publish reaches nobody and does not panic
        notifier.publish(&decision());
    }
}
