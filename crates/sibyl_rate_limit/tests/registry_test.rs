//! Tests for the per-channel governor registry.

use sibyl_rate_limit::{ChannelConfig, GovernorRegistry, SibylConfig};
use std::sync::Arc;
use std::time::Duration;

fn registry() -> GovernorRegistry {
    let mut config = SibylConfig::default();
    config.channels.insert(
        "scrape".to_string(),
        ChannelConfig {
            rpm: Some(1),
            ..ChannelConfig::default()
        },
    );
    GovernorRegistry::new(config).expect("valid config")
}

#[tokio::test(start_paused = true)]
async fn test_same_name_shares_governor() {
    let registry = registry();
    let first = registry.governor("scrape").await;
    let second = registry.governor("scrape").await;
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test(start_paused = true)]
async fn test_channels_are_independent() {
    let registry = registry();
    let scrape = registry.governor("scrape").await;
    scrape.record_call(true).await;

    assert!(!scrape.can_proceed().await.allowed());
    assert!(registry.governor("inference").await.can_proceed().await.allowed());
    assert_eq!(registry.channels().await, vec!["inference", "scrape"]);
}

#[tokio::test(start_paused = true)]
async fn test_configured_channel_uses_own_tiers() {
    let registry = registry();
    assert_eq!(registry.governor("scrape").await.limits().len(), 1);
    assert_eq!(registry.governor("other").await.limits().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_remove_and_reset_start_fresh() {
    let registry = registry();
    let scrape = registry.governor("scrape").await;
    scrape.record_call(false).await;

    let removed = registry.remove("scrape").await.expect("was registered");
    assert!(Arc::ptr_eq(&removed, &scrape));

    let fresh = registry.governor("scrape").await;
    assert_eq!(fresh.consecutive_failures().await, 0);

    registry.governor("inference").await;
    registry.reset().await;
    assert!(registry.channels().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_executor_is_bound_to_channel() {
    let registry = registry();
    let executor = registry.executor("scrape").await;
    let governor = registry.governor("scrape").await;
    assert!(Arc::ptr_eq(executor.governor(), &governor));

    let policy = registry.retry_policy("scrape").expect("default retry");
    assert_eq!(*policy.initial_delay(), Duration::from_secs(1));
}

#[test]
fn test_invalid_backoff_rejected() {
    let mut config = SibylConfig::default();
    config.backoff.rate_limit_cap_secs = f64::NAN;
    assert!(GovernorRegistry::new(config).is_err());
}
