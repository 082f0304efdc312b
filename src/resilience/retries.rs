//! Retry logic.
//!
//! # Responsibilities
//! - Classify failures as retryable (transient) or not (circuit open)
//! - Execute retries with exponential backoff + jitter
//! - Enforce a fixed attempt budget
//!
//! # Design Decisions
//! - The final error is returned as-is once the budget is spent, never wrapped
//! - Non-retryable errors return immediately without sleeping
//! - Sleeps are async so one request's backoff never stalls another

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::BackoffPolicy;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Attempt budget plus delay schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: BackoffPolicy::from(config),
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` attempts have been made.
///
/// A budget below one still performs a single attempt.
pub async fn execute_with_retry<T, E, F, Fut, R>(
    mut operation: F,
    max_attempts: u32,
    backoff: &BackoffPolicy,
    rng: &mut R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
    R: Rng + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        attempts += 1;

        if !error.is_retryable() {
            tracing::debug!(attempt = attempts, error = %error, "Not retrying");
            return Err(error);
        }

        if attempts >= max_attempts {
            tracing::error!(attempts, error = %error, "Retries exhausted");
            metrics::record_retries_exhausted();
            return Err(error);
        }

        let delay = backoff.delay(attempts - 1, rng);
        tracing::warn!(
            attempt = attempts,
            max_attempts,
            delay_ms = whole_millis(delay),
            error = %error,
            "Retrying after transient failure"
        );
        metrics::record_retry();
        tokio::time::sleep(delay).await;
    }
}

/// Milliseconds for log fields, saturating instead of truncating.
fn whole_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
