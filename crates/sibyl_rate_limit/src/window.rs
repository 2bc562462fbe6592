//! Rate limit tiers.

use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// One independently enforced tier: at most `max_calls` calls per `window`.
///
/// # Example
///
/// ```
/// use sibyl_rate_limit::WindowLimit;
/// use std::time::Duration;
///
/// let tier = WindowLimit::per_minute(60);
/// assert_eq!(*tier.max_calls(), 60);
/// assert_eq!(*tier.window(), Duration::from_secs(60));
/// assert_eq!(tier.label(), "minute");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct WindowLimit {
    /// Display name of the tier
    label: String,
    /// Calls allowed inside one window
    max_calls: u32,
    /// Length of the sliding window
    window: Duration,
}

impl WindowLimit {
    /// Create a tier with a custom window.
    pub fn new(label: impl Into<String>, max_calls: u32, window: Duration) -> Self {
        Self {
            label: label.into(),
            max_calls,
            window,
        }
    }

    /// Requests per minute.
    pub fn per_minute(max_calls: u32) -> Self {
        Self::new("minute", max_calls, MINUTE)
    }

    /// Requests per hour.
    pub fn per_hour(max_calls: u32) -> Self {
        Self::new("hour", max_calls, HOUR)
    }

    /// Requests per day.
    pub fn per_day(max_calls: u32) -> Self {
        Self::new("day", max_calls, DAY)
    }
}
