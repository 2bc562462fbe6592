//! Adaptive cooldown schedule.

use std::time::Duration;

/// Cooldown schedule applied by a [`RateGovernor`](crate::RateGovernor).
///
/// Generic failures back off exponentially (`2^n` seconds) but cap low, since
/// they may be transient. Rate-limit signals without a server hint back off
/// linearly (`rate_limit_step * n`) up to a higher cap.
///
/// # Example
///
/// ```
/// use sibyl_rate_limit::BackoffConfig;
/// use std::time::Duration;
///
/// let backoff = BackoffConfig::default();
/// assert_eq!(backoff.failure_delay(3), Duration::from_secs(8));
/// assert_eq!(backoff.failure_delay(20), Duration::from_secs(300));
/// assert_eq!(backoff.rate_limit_delay(2), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackoffConfig {
    /// Upper bound for the exponential failure cooldown
    pub failure_cap: Duration,
    /// Increment per consecutive failure for unhinted rate-limit signals
    pub rate_limit_step: Duration,
    /// Upper bound for the unhinted rate-limit cooldown
    pub rate_limit_cap: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            failure_cap: Duration::from_secs(300),
            rate_limit_step: Duration::from_secs(30),
            rate_limit_cap: Duration::from_secs(600),
        }
    }
}

impl BackoffConfig {
    /// Cooldown after `consecutive_failures` generic failures.
    pub fn failure_delay(&self, consecutive_failures: u32) -> Duration {
        let secs = 1u64
            .checked_shl(consecutive_failures)
            .unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.failure_cap)
    }

    /// Cooldown after an unhinted rate-limit signal.
    pub fn rate_limit_delay(&self, consecutive_failures: u32) -> Duration {
        self.rate_limit_step
            .saturating_mul(consecutive_failures)
            .min(self.rate_limit_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_delay_doubles_until_cap() {
        let backoff = BackoffConfig::default();
        let delays: Vec<u64> = (1..=9).map(|n| backoff.failure_delay(n).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 32, 64, 128, 256, 300]);
    }

    #[test]
    fn test_failure_delay_survives_huge_counts() {
        let backoff = BackoffConfig::default();
        assert_eq!(backoff.failure_delay(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn test_rate_limit_delay_is_linear_until_cap() {
        let backoff = BackoffConfig::default();
        assert_eq!(backoff.rate_limit_delay(1), Duration::from_secs(30));
        assert_eq!(backoff.rate_limit_delay(19), Duration::from_secs(570));
        assert_eq!(backoff.rate_limit_delay(25), Duration::from_secs(600));
    }
}
