//! Retry with exponential backoff and jitter for gallery API calls.
//!
//! Only errors for which [`GalleryError::is_retryable`] holds are retried:
//! transport failures, timeouts and 5xx envelopes. 4xx answers and decode
//! failures are returned immediately.

use crate::config::{ClientConfig, NetworkConfig};
use crate::{GalleryError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one. Zero acts as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each later retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay, jitter included.
    pub max_delay: Duration,
    /// Multiply each delay by a random factor in `0.5..1.5`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: NetworkConfig::MAX_RETRIES,
            base_delay: NetworkConfig::RETRY_BASE_DELAY,
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a retry policy from client settings.
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self::default().with_max_attempts(config.max_retries)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-indexed): `base * 2^attempt`, capped.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let multiplier = 2f64.powi(attempt.min(30) as i32);
        let capped_secs =
            (self.base_delay.as_secs_f64() * multiplier).min(self.max_delay.as_secs_f64());

        let final_secs = if self.jitter {
            let factor = rand::rng().random_range(0.5..1.5);
            (capped_secs * factor).min(self.max_delay.as_secs_f64())
        } else {
            capped_secs
        };

        Duration::from_secs_f64(final_secs)
    }
}

/// Outcome bookkeeping for one retried call.
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Time spent sleeping between attempts.
    pub total_delay: Duration,
    /// Whether the final attempt succeeded.
    pub success: bool,
    /// Message of the most recent failure, if any.
    pub last_error: Option<String>,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. `label` names the call in logs.
pub async fn retry_async<F, Fut, T>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> (Result<T>, RetryStats)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut stats = RetryStats::default();
    let mut attempt = 0;

    loop {
        stats.attempts = attempt + 1;

        let err: GalleryError = match operation().await {
            Ok(value) => {
                stats.success = true;
                if attempt > 0 {
                    debug!("{} succeeded after {} attempts", label, attempt + 1);
                }
                return (Ok(value), stats);
            }
            Err(e) => e,
        };

        stats.last_error = Some(err.to_string());

        if !err.is_retryable() {
            debug!("{} failed with non-retryable error: {}", label, err);
            return (Err(err), stats);
        }

        if attempt + 1 >= max_attempts {
            warn!(
                "{}: all {} attempts exhausted. Last error: {}",
                label, max_attempts, err
            );
            return (Err(err), stats);
        }

        let delay = config.calculate_delay(attempt);
        stats.total_delay += delay;
        warn!(
            "{}: attempt {}/{} failed: {}. Retrying in {:?}",
            label,
            attempt + 1,
            max_attempts,
            err,
            delay
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
