//! Rate limit configuration per service category.

use crate::domain::category::ServiceCategory;
use std::time::Duration;

/// Error returned when rate limit configuration validation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Burst limit must be greater than zero
    ZeroBurstLimit,
    /// Rate limit must be greater than zero
    ZeroRateLimit,
    /// Window durations must be greater than zero
    ZeroWindow,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroBurstLimit => write!(f, "burst limit must be greater than 0"),
            ConfigError::ZeroRateLimit => write!(f, "rate limit must be greater than 0"),
            ConfigError::ZeroWindow => write!(f, "window duration must be greater than 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Limits applied to one service category.
///
/// Two independent sliding windows are evaluated against the same ledger: a
/// short burst window bounding spikes and a longer rate window bounding
/// sustained volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum accepted requests within the burst window
    pub burst_limit: usize,
    /// Length of the burst window
    pub burst_window: Duration,
    /// Maximum accepted requests within the rate window
    pub rate_limit: usize,
    /// Length of the rate window
    pub rate_window: Duration,
}

/// Default burst window applied to every category.
pub const DEFAULT_BURST_WINDOW: Duration = Duration::from_secs(10);
/// Default rate window applied to every category.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

impl RateLimitConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Fails fast on zero limits or zero windows; silently accepting them
    /// would turn the throttle into always-deny or always-allow.
    pub fn new(
        burst_limit: usize,
        burst_window: Duration,
        rate_limit: usize,
        rate_window: Duration,
    ) -> Result<Self, ConfigError> {
        if burst_limit == 0 {
            return Err(ConfigError::ZeroBurstLimit);
        }
        if rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if burst_window.is_zero() || rate_window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self {
            burst_limit,
            burst_window,
            rate_limit,
            rate_window,
        })
    }

    /// Create a configuration with the default windows.
    ///
    /// # Errors
    /// Same validation as [`RateLimitConfig::new`].
    pub fn with_limits(burst_limit: usize, rate_limit: usize) -> Result<Self, ConfigError> {
        Self::new(
            burst_limit,
            DEFAULT_BURST_WINDOW,
            rate_limit,
            DEFAULT_RATE_WINDOW,
        )
    }

    /// Built-in defaults for a category.
    ///
    /// Authentication is the most conservative; telemetry the most
    /// permissive, since dropping a telemetry call is cheap.
    pub fn default_for(category: ServiceCategory) -> Self {
        let (burst_limit, rate_limit) = match category {
            ServiceCategory::Authentication => (5, 30),
            ServiceCategory::BulkRead => (10, 100),
            ServiceCategory::BulkWrite => (10, 50),
            ServiceCategory::Telemetry => (20, 200),
        };
        Self {
            burst_limit,
            burst_window: DEFAULT_BURST_WINDOW,
            rate_limit,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}
