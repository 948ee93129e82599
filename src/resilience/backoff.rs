//! Retry policy with exponential backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Decides whether a finished attempt is retried, and how long to wait
/// before the next one.
///
/// `max_retries` counts retries, not attempts: with `max_retries = 3` an
/// item is attempted at most four times. `max_retries = 0` disables
/// retries entirely, whatever the status.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries per item.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Upstream status codes that are worth retrying.
    pub retryable_status: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            retryable_status: vec![429],
        }
    }
}

impl RetryPolicy {
    /// Whether to retry after an attempt that produced `status`, given the
    /// number of retries already performed.
    pub fn should_retry(&self, status: u16, retries_done: u32) -> bool {
        retries_done < self.max_retries && self.retryable_status.contains(&status)
    }

    /// Delay before retry number `next_retry` (1-indexed): the first retry
    /// waits `base_delay_ms`, each further retry doubles it.
    pub fn delay_for(&self, next_retry: u32) -> Duration {
        let exponent = next_retry.saturating_sub(1).min(31);
        let delay_ms = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay_ms)
    }
}
