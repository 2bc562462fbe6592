//! Sliding-window admission control with adaptive backoff.
//!
//! A [`RateGovernor`] tracks the instants at which calls were made on one channel
//! and answers a single question before each new call: may it proceed now, and if
//! not, how long should the caller wait?
//!
//! Two independent mechanisms can block a call:
//! - **Tiers**: every [`WindowLimit`] is checked on each decision. A channel can be
//!   within its per-minute budget and still have exhausted its daily one.
//! - **Backoff**: after a failure or an explicit rate-limit signal the channel is
//!   closed until a deadline computed from [`BackoffConfig`].
//!
//! All timing uses [`tokio::time::Instant`], so tests can drive the governor with
//! paused time.

use crate::{BackoffConfig, WindowLimit};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

/// Longest cooldown or window wait the governor will schedule.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// `from + delay` without overflowing the clock.
fn deadline(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay.min(FAR_FUTURE)).unwrap_or(from)
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Admission {
    allowed: bool,
    wait: Option<Duration>,
}

impl Admission {
    fn granted() -> Self {
        Self {
            allowed: true,
            wait: None,
        }
    }

    fn blocked(wait: Duration) -> Self {
        Self {
            allowed: false,
            wait: Some(wait),
        }
    }

    /// Whether the call may proceed immediately.
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// How long to wait before the call may proceed. `None` when allowed.
    pub fn wait(&self) -> Option<Duration> {
        self.wait
    }
}

/// Usage of a single tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    /// Tier label ("minute", "hour", "day", ...)
    pub label: String,
    /// Calls inside the current window
    pub used: u32,
    /// Configured maximum
    pub limit: u32,
    /// `used / limit * 100`, zero for a zero limit
    pub percentage: f64,
    /// Calls left before the tier saturates
    pub remaining: u32,
}

/// Snapshot of a governor's usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernorStats {
    /// Per-tier usage in ascending window order
    pub tiers: Vec<TierStats>,
    /// Remaining cooldown, zero once elapsed; `None` when no backoff is set
    pub backoff_remaining: Option<Duration>,
}

impl GovernorStats {
    /// Look up a tier by label.
    pub fn tier(&self, label: &str) -> Option<&TierStats> {
        self.tiers.iter().find(|t| t.label == label)
    }
}

#[derive(Debug, Default)]
struct GovernorState {
    /// Recorded call instants, oldest first
    history: VecDeque<Instant>,
    consecutive_failures: u32,
    backoff_until: Option<Instant>,
}

impl GovernorState {
    fn evict(&mut self, now: Instant, horizon: Duration) {
        while let Some(oldest) = self.history.front() {
            if now.saturating_duration_since(*oldest) >= horizon {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Calls inside `window` and the oldest of them.
    fn window_usage(&self, now: Instant, window: Duration) -> (u32, Option<Instant>) {
        let mut in_window = self
            .history
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < window);
        let oldest = in_window.next().copied();
        let count = oldest.map_or(0, |_| 1 + in_window.count());
        (u32::try_from(count).unwrap_or(u32::MAX), oldest)
    }
}

/// Admission controller for one named channel.
///
/// Tiers are kept sorted by ascending window. Mutation happens under one
/// per-governor lock, so a governor can be shared across tasks through an
/// `Arc` and its history always reflects exactly the calls recorded.
///
/// # Example
///
/// ```no_run
/// use sibyl_rate_limit::RateGovernor;
///
/// # #[tokio::main]
/// # async fn main() {
/// let governor = RateGovernor::standard("scrape", 60, 1000, 10_000);
///
/// let admission = governor.can_proceed().await;
/// if let Some(wait) = admission.wait() {
///     tokio::time::sleep(wait).await;
/// }
/// // ... make the call ...
/// governor.record_call(true).await;
/// # }
/// ```
#[derive(Debug)]
pub struct RateGovernor {
    name: String,
    limits: Vec<WindowLimit>,
    backoff: BackoffConfig,
    /// Largest window; older history is never consulted
    horizon: Duration,
    /// History bound, the largest-window tier's limit
    capacity: usize,
    state: Mutex<GovernorState>,
}

impl RateGovernor {
    /// Create a governor enforcing `limits` with the given cooldown schedule.
    pub fn new(name: impl Into<String>, mut limits: Vec<WindowLimit>, backoff: BackoffConfig) -> Self {
        limits.sort_by_key(|l| *l.window());
        let horizon = limits.last().map_or(Duration::ZERO, |l| *l.window());
        let capacity = limits.last().map_or(0, |l| *l.max_calls() as usize);
        let name = name.into();

        debug!(
            channel = %name,
            tiers = limits.len(),
            capacity,
            "Creating rate governor"
        );

        Self {
            name,
            limits,
            backoff,
            horizon,
            capacity,
            state: Mutex::new(GovernorState {
                history: VecDeque::with_capacity(capacity.min(1024)),
                ..GovernorState::default()
            }),
        }
    }

    /// Minute, hour and day tiers with the default cooldown schedule.
    pub fn standard(name: impl Into<String>, per_minute: u32, per_hour: u32, per_day: u32) -> Self {
        Self::new(
            name,
            vec![
                WindowLimit::per_minute(per_minute),
                WindowLimit::per_hour(per_hour),
                WindowLimit::per_day(per_day),
            ],
            BackoffConfig::default(),
        )
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured tiers, ascending by window.
    pub fn limits(&self) -> &[WindowLimit] {
        &self.limits
    }

    /// Cooldown schedule.
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }

    /// Decide whether a call may proceed now.
    ///
    /// An active cooldown wins over tier checks. Otherwise each saturated tier
    /// contributes the time until its oldest in-window call leaves the window,
    /// and the longest of those is returned.
    #[instrument(skip(self), fields(channel = %self.name))]
    pub async fn can_proceed(&self) -> Admission {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if let Some(until) = state.backoff_until {
            if now < until {
                let wait = until - now;
                debug!(wait_secs = wait.as_secs_f64(), "In backoff cooldown");
                return Admission::blocked(wait);
            }
        }

        state.evict(now, self.horizon);

        let mut longest: Option<Duration> = None;
        for limit in &self.limits {
            let (used, oldest) = state.window_usage(now, *limit.window());
            if used < *limit.max_calls() {
                continue;
            }
            let wait = oldest.map_or(*limit.window(), |t| {
                deadline(t, *limit.window()).saturating_duration_since(now)
            });
            debug!(
                tier = %limit.label(),
                used,
                limit = *limit.max_calls(),
                wait_secs = wait.as_secs_f64(),
                "Tier saturated"
            );
            longest = Some(longest.map_or(wait, |w| w.max(wait)));
        }

        match longest {
            Some(wait) => Admission::blocked(wait),
            None => {
                trace!("Admission granted");
                Admission::granted()
            }
        }
    }

    /// Record that a call was made and whether it succeeded.
    ///
    /// Success clears any cooldown. Failure extends the exponential cooldown.
    #[instrument(skip(self), fields(channel = %self.name))]
    pub async fn record_call(&self, success: bool) {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if self.capacity > 0 {
            if state.history.len() >= self.capacity {
                state.history.pop_front();
            }
            state.history.push_back(now);
        }

        if success {
            if state.consecutive_failures > 0 {
                debug!(
                    previous_failures = state.consecutive_failures,
                    "Call succeeded, clearing backoff"
                );
            }
            state.consecutive_failures = 0;
            state.backoff_until = None;
        } else {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            let delay = self.backoff.failure_delay(state.consecutive_failures);
            state.backoff_until = Some(deadline(now, delay));
            warn!(
                consecutive_failures = state.consecutive_failures,
                backoff_secs = delay.as_secs_f64(),
                "Call failed, backing off"
            );
        }
    }

    /// Record an explicit rate-limit signal from the remote service.
    ///
    /// A non-zero `retry_after` hint is used verbatim, up to thirty years.
    /// Without one the cooldown grows linearly with consecutive failures.
    #[instrument(skip(self), fields(channel = %self.name))]
    pub async fn record_rate_limit_signal(&self, retry_after: Option<Duration>) {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        let delay = match retry_after.filter(|d| !d.is_zero()) {
            Some(hint) => hint,
            None => self.backoff.rate_limit_delay(state.consecutive_failures),
        };
        let until = deadline(now, delay);
        state.backoff_until = Some(until);

        warn!(
            consecutive_failures = state.consecutive_failures,
            hinted = retry_after.is_some(),
            backoff_secs = (until - now).as_secs_f64(),
            "Rate limit signalled, backing off"
        );
    }

    /// Usage per tier and remaining cooldown.
    #[instrument(skip(self), fields(channel = %self.name))]
    pub async fn stats(&self) -> GovernorStats {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.evict(now, self.horizon);

        let tiers = self
            .limits
            .iter()
            .map(|limit| {
                let (used, _) = state.window_usage(now, *limit.window());
                let max = *limit.max_calls();
                TierStats {
                    label: limit.label().clone(),
                    used,
                    limit: max,
                    percentage: if max > 0 {
                        f64::from(used) / f64::from(max) * 100.0
                    } else {
                        0.0
                    },
                    remaining: max.saturating_sub(used),
                }
            })
            .collect();

        GovernorStats {
            tiers,
            backoff_remaining: state
                .backoff_until
                .map(|until| until.saturating_duration_since(now)),
        }
    }

    /// Failures since the last success.
    pub async fn consecutive_failures(&self) -> u32 {
        self.state.lock().await.consecutive_failures
    }

    /// End of the current cooldown, if any.
    pub async fn backoff_until(&self) -> Option<Instant> {
        self.state.lock().await.backoff_until
    }

    /// Number of recorded calls still held in history.
    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }
}
