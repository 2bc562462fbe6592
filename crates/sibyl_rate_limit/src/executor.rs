//! Retry executor that consults a rate governor before every attempt.

use crate::{RateGovernor, RetryPolicy};
use sibyl_error::RetryableError;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Runs an outbound operation with bounded retries on one governed channel.
///
/// For every attempt the executor:
/// 1. asks the governor for admission and sleeps for the reported wait if blocked
/// 2. runs the operation
/// 3. records the outcome with the governor before deciding what to do next
///
/// Rate-limit failures honour a server `retry_after` hint when present.
/// Generic failures use the policy's exponential schedule. Errors that report
/// `is_retryable() == false` are returned after the first attempt. The shared
/// delay grows by `backoff_factor` after every retry and is never reset.
///
/// Dropping the future returned by [`execute`](Self::execute) cancels the call at
/// its next suspension point. Outcomes are recorded before any sleep, so the
/// governor is always left consistent.
///
/// # Example
///
/// ```rust,ignore
/// let executor = RetryExecutor::new(governor);
/// let tweets = executor
///     .execute(&RetryPolicy::default(), || async { scraper.run(&query).await })
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    governor: Arc<RateGovernor>,
}

impl RetryExecutor {
    /// Create an executor bound to a governor.
    pub fn new(governor: Arc<RateGovernor>) -> Self {
        Self { governor }
    }

    /// The governor consulted before every attempt.
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Execute `operation` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns the last error once `max_retries + 1` attempts have failed, or the
    /// first non-retryable error.
    #[instrument(skip_all, fields(channel = %self.governor.name(), max_retries = *policy.max_retries()))]
    pub async fn execute<F, Fut, T, E>(&self, policy: &RetryPolicy, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        let max_retries = *policy.max_retries();
        let max_delay = *policy.max_delay();
        let mut delay = *policy.initial_delay();
        let mut attempt: u32 = 0;

        loop {
            let admission = self.governor.can_proceed().await;
            if !admission.allowed() {
                if let Some(wait) = admission.wait() {
                    debug!(attempt, wait_secs = wait.as_secs_f64(), "Governor requested wait");
                    tokio::time::sleep(wait).await;
                }
            }

            let error = match operation().await {
                Ok(value) => {
                    self.governor.record_call(true).await;
                    debug!(attempt, "Operation succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            let wait = if error.is_rate_limit() {
                let hint = error.retry_after().filter(|d| !d.is_zero());
                self.governor.record_rate_limit_signal(hint).await;
                hint.unwrap_or(delay).min(max_delay)
            } else {
                self.governor.record_call(false).await;
                if !error.is_retryable() {
                    warn!(attempt, error = %error, "Permanent error, failing immediately");
                    return Err(error);
                }
                delay.min(max_delay)
            };

            if attempt >= max_retries {
                warn!(attempts = attempt + 1, error = %error, "Retries exhausted");
                return Err(error);
            }

            warn!(
                attempt = attempt + 1,
                max_retries,
                wait_secs = wait.as_secs_f64(),
                rate_limited = error.is_rate_limit(),
                error = %error,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(wait).await;
            delay = policy.next_delay(delay);
            attempt += 1;
        }
    }
}
