//! Query behavior: freshness window, stale policy and retry policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ApiError, FetchError};

/// Upper bound on automatic retries accepted by validation.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// What an invalidation does to cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Keep serving the stale data until the refetch resolves.
    KeepPrevious,
    /// Drop cached data immediately.
    Clear,
}

impl Default for StalePolicy {
    fn default() -> Self {
        StalePolicy::KeepPrevious
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables automatic retry.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    pub fn exponential(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Whether to retry after `attempt` (1-based) failed with `error`.
    pub fn should_retry(&self, attempt: u32, error: &FetchError) -> bool {
        attempt <= self.max_retries && error.is_retryable()
    }

    /// Backoff before the retry that follows `attempt` (1-based):
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(format!(
                "max_retries {} exceeds limit of {}",
                self.max_retries, MAX_RETRIES_LIMIT
            ));
        }
        if self.base_delay > self.max_delay {
            return Err(format!(
                "base delay {:?} exceeds max delay {:?}",
                self.base_delay, self.max_delay
            ));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Per-cache query configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful result counts as fresh.
    pub stale_time: Duration,
    pub stale_policy: StalePolicy,
    pub retry: RetryPolicy,
}

impl QueryOptions {
    /// Build validated options.
    pub fn new(
        stale_time: Duration,
        stale_policy: StalePolicy,
        retry: RetryPolicy,
    ) -> Result<Self, ApiError> {
        let options = Self {
            stale_time,
            stale_policy,
            retry,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.retry
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("Invalid retry policy: {}", e)))
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            stale_policy: StalePolicy::KeepPrevious,
            retry: RetryPolicy::none(),
        }
    }
}
