//! Retry policy configuration.

use sibyl_error::{ConfigError, SibylResult};
use std::time::Duration;

/// Bounded exponential retry schedule.
///
/// Supplied by the caller of [`RetryExecutor`](crate::RetryExecutor), never by
/// the governor. Total attempts are `max_retries + 1`.
///
/// # Examples
///
/// ```
/// use sibyl_rate_limit::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(500))
///     .build();
///
/// assert_eq!(*policy.max_retries(), 5);
/// assert_eq!(*policy.backoff_factor(), 2.0); // Default
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    max_retries: u32,
    /// Delay before the first retry.
    initial_delay: Duration,
    /// Multiplier applied to the delay after every retry.
    backoff_factor: f64,
    /// Upper bound for any single delay.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Validates the schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is not finite or below 1.0, or if the
    /// initial delay exceeds the maximum delay.
    pub fn validate(&self) -> SibylResult<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigError::invalid_field(
                "backoff_factor",
                format!("must be finite and >= 1.0, got {}", self.backoff_factor),
            )
            .into());
        }
        if self.initial_delay > self.max_delay {
            return Err(ConfigError::new(format!(
                "initial delay {:?} exceeds max delay {:?}",
                self.initial_delay, self.max_delay
            ))
            .into());
        }
        Ok(())
    }

    /// Delay following `current` in the schedule, clamped to `max_delay`.
    ///
    /// Clamping does not change any observable wait, since every wait is
    /// already capped at `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Sum of every generic-failure wait the policy can impose.
    pub fn worst_case_wait(&self) -> Duration {
        let mut delay = self.initial_delay;
        let mut total = Duration::ZERO;
        for _ in 0..self.max_retries {
            total = total.saturating_add(delay.min(self.max_delay));
            delay = self.next_delay(delay);
        }
        total
    }
}

/// Builder for `RetryPolicy`.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    backoff_factor: Option<f64>,
    max_delay: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Sets the number of retries after the first attempt.
    pub fn max_retries(mut self, value: u32) -> Self {
        self.max_retries = Some(value);
        self
    }

    /// Sets the delay before the first retry.
    pub fn initial_delay(mut self, value: Duration) -> Self {
        self.initial_delay = Some(value);
        self
    }

    /// Sets the delay multiplier.
    pub fn backoff_factor(mut self, value: f64) -> Self {
        self.backoff_factor = Some(value);
        self
    }

    /// Sets the per-wait cap.
    pub fn max_delay(mut self, value: Duration) -> Self {
        self.max_delay = Some(value);
        self
    }

    /// Builds the `RetryPolicy`, filling unset fields with defaults.
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            initial_delay: self.initial_delay.unwrap_or(defaults.initial_delay),
            backoff_factor: self.backoff_factor.unwrap_or(defaults.backoff_factor),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_grows_and_caps() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5))
            .build();

        let d1 = policy.next_delay(Duration::from_secs(1));
        let d2 = policy.next_delay(d1);
        let d3 = policy.next_delay(d2);
        assert_eq!(d1, Duration::from_secs(2));
        assert_eq!(d2, Duration::from_secs(4));
        assert_eq!(d3, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_bad_factor() {
        let policy = RetryPolicy::builder().backoff_factor(0.5).build();
        assert!(policy.validate().is_err());

        let policy = RetryPolicy::builder().backoff_factor(f64::NAN).build();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_secs(10))
            .max_delay(Duration::from_secs(1))
            .build();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_worst_case_wait() {
        // 1 + 2 + 4 seconds
        let policy = RetryPolicy::default();
        assert_eq!(policy.worst_case_wait(), Duration::from_secs(7));
    }
}
