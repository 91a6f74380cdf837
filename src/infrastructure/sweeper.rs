//! Periodic background eviction of stale ledger entries.
//!
//! The check path already evicts per call, so this is a maintenance task,
//! not a correctness requirement: it bounds memory for categories that stop
//! being queried and would otherwise hold their last window of timestamps
//! forever.

use crate::application::throttle::RequestThrottle;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::debug;

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweeperConfigError {
    /// Sweep interval duration must be greater than zero
    ZeroInterval,
}

impl std::fmt::Display for SweeperConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweeperConfigError::ZeroInterval => {
                write!(f, "sweep interval must be greater than 0")
            }
        }
    }
}

impl std::error::Error for SweeperConfigError {}

/// Configuration for the periodic sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// How often to walk the ledgers
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

impl SweeperConfig {
    /// Create a sweeper config with the specified interval.
    ///
    /// # Errors
    /// Returns `SweeperConfigError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroInterval);
        }
        Ok(Self { interval })
    }
}

/// Recurring eviction task over a shared throttle.
pub struct PeriodicSweeper {
    throttle: Arc<RequestThrottle>,
    config: SweeperConfig,
}

impl PeriodicSweeper {
    /// Create a sweeper for the given throttle.
    pub fn new(throttle: Arc<RequestThrottle>, config: SweeperConfig) -> Self {
        Self { throttle, config }
    }

    /// Run one eviction pass immediately, without the timer.
    ///
    /// Returns the number of entries evicted.
    pub fn sweep_once(&self) -> usize {
        self.throttle.sweep()
    }

    /// Get the sweeper configuration.
    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Spawn the recurring sweep task on the current tokio runtime.
    ///
    /// Each tick walks every ledger; the cost is proportional to the total
    /// entries held. The task runs until [`SweeperHandle::shutdown`] is
    /// called; dropping the handle does NOT stop it.
    pub fn start(self) -> SweeperHandle {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);

            loop {
                ticker.tick().await;
                let evicted = self.throttle.sweep();
                if evicted > 0 {
                    debug!(evicted, "periodic sweep completed");
                }
            }
        });

        SweeperHandle { handle }
    }
}

/// Handle for stopping a running sweeper task.
///
/// Shutdown is explicit so a teardown path owns the decision; the task keeps
/// running if the handle is merely dropped.
pub struct SweeperHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep timer and release the task.
    pub fn shutdown(self) {
        self.handle.abort();
    }

    /// Check whether the task has terminated.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
