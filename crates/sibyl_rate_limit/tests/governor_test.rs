//! Tests for sliding-window admission and adaptive backoff.

use sibyl_rate_limit::{BackoffConfig, RateGovernor, WindowLimit};
use std::time::Duration;
use tokio::time::{Instant, advance};

fn governor(limits: Vec<WindowLimit>) -> RateGovernor {
    RateGovernor::new("test", limits, BackoffConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_failures_back_off_exponentially_with_cap() {
    for n in 1..=12u32 {
        let governor = governor(vec![WindowLimit::per_day(1000)]);
        for _ in 0..n {
            governor.record_call(false).await;
        }
        let now = Instant::now();
        let expected = Duration::from_secs((1u64 << n).min(300));

        assert_eq!(governor.consecutive_failures().await, n);
        assert_eq!(governor.backoff_until().await, Some(now + expected), "n = {}", n);
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_failures_and_backoff() {
    let governor = governor(vec![WindowLimit::per_minute(100)]);
    governor.record_call(false).await;
    governor.record_call(false).await;
    governor.record_rate_limit_signal(None).await;
    assert_eq!(governor.consecutive_failures().await, 3);

    governor.record_call(true).await;

    assert_eq!(governor.consecutive_failures().await, 0);
    assert_eq!(governor.backoff_until().await, None);
    assert!(governor.can_proceed().await.allowed());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_wait_decreases_until_deadline() {
    let governor = governor(vec![WindowLimit::per_minute(100)]);
    governor.record_call(false).await; // 2s cooldown

    let first = governor.can_proceed().await;
    assert!(!first.allowed());
    assert_eq!(first.wait(), Some(Duration::from_secs(2)));

    advance(Duration::from_millis(500)).await;
    let second = governor.can_proceed().await;
    assert!(!second.allowed());
    assert_eq!(second.wait(), Some(Duration::from_millis(1500)));

    advance(Duration::from_millis(1500)).await;
    let third = governor.can_proceed().await;
    assert!(third.allowed());
    assert_eq!(third.wait(), None);
}

#[tokio::test(start_paused = true)]
async fn test_minute_tier_blocks_until_window_elapses() {
    let governor = RateGovernor::standard("test", 3, 100, 1000);
    for _ in 0..3 {
        assert!(governor.can_proceed().await.allowed());
        governor.record_call(true).await;
    }

    let blocked = governor.can_proceed().await;
    assert!(!blocked.allowed());
    assert_eq!(blocked.wait(), Some(Duration::from_secs(60)));

    advance(Duration::from_secs(30)).await;
    assert_eq!(
        governor.can_proceed().await.wait(),
        Some(Duration::from_secs(30))
    );

    advance(Duration::from_secs(30)).await;
    assert!(governor.can_proceed().await.allowed());
}

#[tokio::test(start_paused = true)]
async fn test_hour_tier_blocks_while_minute_tier_has_room() {
    let governor = governor(vec![WindowLimit::per_minute(2), WindowLimit::per_hour(3)]);
    governor.record_call(true).await;
    governor.record_call(true).await;

    advance(Duration::from_secs(61)).await;
    assert!(governor.can_proceed().await.allowed());
    governor.record_call(true).await;

    let blocked = governor.can_proceed().await;
    assert!(!blocked.allowed());
    assert_eq!(blocked.wait(), Some(Duration::from_secs(3600 - 61)));
}

#[tokio::test(start_paused = true)]
async fn test_most_restrictive_tier_sets_wait() {
    let governor = governor(vec![WindowLimit::per_minute(1), WindowLimit::per_hour(1)]);
    governor.record_call(true).await;

    let blocked = governor.can_proceed().await;
    assert_eq!(blocked.wait(), Some(Duration::from_secs(3600)));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_hint_wins() {
    let governor = governor(vec![WindowLimit::per_minute(10)]);
    governor.record_rate_limit_signal(Some(Duration::from_secs(5))).await;

    let now = Instant::now();
    assert_eq!(governor.consecutive_failures().await, 1);
    assert_eq!(
        governor.backoff_until().await,
        Some(now + Duration::from_secs(5))
    );
}

#[tokio::test(start_paused = true)]
async fn test_unhinted_rate_limit_grows_linearly_with_cap() {
    let governor = governor(vec![WindowLimit::per_minute(10)]);

    governor.record_rate_limit_signal(None).await;
    assert_eq!(
        governor.backoff_until().await,
        Some(Instant::now() + Duration::from_secs(30))
    );

    governor.record_rate_limit_signal(None).await;
    assert_eq!(
        governor.backoff_until().await,
        Some(Instant::now() + Duration::from_secs(60))
    );

    for _ in 0..30 {
        governor.record_rate_limit_signal(None).await;
    }
    assert_eq!(
        governor.backoff_until().await,
        Some(Instant::now() + Duration::from_secs(600))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_signal_does_not_consume_budget() {
    let governor = governor(vec![WindowLimit::per_minute(1)]);
    governor.record_rate_limit_signal(Some(Duration::from_secs(1))).await;
    advance(Duration::from_secs(1)).await;

    assert!(governor.can_proceed().await.allowed());
    assert_eq!(governor.stats().await.tiers[0].used, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stats_report_usage() {
    let governor = RateGovernor::standard("test", 4, 100, 1000);
    governor.record_call(true).await;
    governor.record_call(true).await;
    governor.record_call(false).await;

    let stats = governor.stats().await;
    let minute = stats.tier("minute").expect("minute tier");
    assert_eq!(minute.used, 3);
    assert_eq!(minute.limit, 4);
    assert_eq!(minute.percentage, 75.0);
    assert_eq!(minute.remaining, 1);

    let day = stats.tier("day").expect("day tier");
    assert_eq!(day.remaining, 997);

    assert_eq!(stats.backoff_remaining, Some(Duration::from_secs(2)));

    advance(Duration::from_secs(5)).await;
    assert_eq!(
        governor.stats().await.backoff_remaining,
        Some(Duration::ZERO)
    );
}

#[tokio::test(start_paused = true)]
async fn test_stats_without_backoff() {
    let governor = RateGovernor::standard("test", 4, 100, 1000);
    governor.record_call(true).await;
    assert_eq!(governor.stats().await.backoff_remaining, None);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_cooldowns_do_not_overflow_the_clock() {
    let governor = RateGovernor::new(
        "unbounded",
        vec![WindowLimit::per_minute(100)],
        BackoffConfig {
            failure_cap: Duration::MAX,
            rate_limit_step: Duration::MAX,
            rate_limit_cap: Duration::MAX,
        },
    );
    let year = Duration::from_secs(365 * 24 * 60 * 60);

    governor.record_rate_limit_signal(None).await;
    let wait = governor.can_proceed().await.wait().expect("in cooldown");
    assert!(wait > year);

    governor.record_rate_limit_signal(Some(Duration::MAX)).await;
    assert!(!governor.can_proceed().await.allowed());

    // The exponential shift overflows past 63 failures
    for _ in 0..70 {
        governor.record_call(false).await;
    }
    let wait = governor.can_proceed().await.wait().expect("in cooldown");
    assert!(wait > year);
    assert!(governor.stats().await.backoff_remaining.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_window_does_not_overflow_the_clock() {
    let governor = governor(vec![WindowLimit::new("forever", 1, Duration::MAX)]);

    governor.record_call(true).await;
    advance(Duration::from_secs(3600)).await;

    let admission = governor.can_proceed().await;
    assert!(!admission.allowed());
    assert!(admission.wait().expect("tier saturated") > Duration::from_secs(3600));
    assert_eq!(governor.stats().await.tiers[0].used, 1);
}
