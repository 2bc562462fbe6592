//! Admission control and retry for outbound API calls.
//!
//! This crate governs every call a scrape-then-infer pipeline makes to a remote
//! service. It combines:
//! - [`RateGovernor`]: sliding-window limits across several tiers (minute, hour,
//!   day) plus an adaptive cooldown after failures and rate-limit signals
//! - [`RetryExecutor`]: bounded retry with exponential backoff that consults the
//!   governor before every attempt
//! - [`GovernorRegistry`]: one governor per named channel, created on first use
//! - [`SibylConfig`]: TOML configuration with bundled defaults and user overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use sibyl_rate_limit::{GovernorRegistry, SibylConfig};
//!
//! let registry = GovernorRegistry::new(SibylConfig::load()?)?;
//! let executor = registry.executor("inference").await;
//! let policy = registry.retry_policy("inference")?;
//!
//! let text = executor.execute(&policy, || async { client.generate(&prompt).await }).await?;
//! ```

#![forbid(unsafe_code)]

mod backoff;
mod config;
mod executor;
mod governor;
mod policy;
mod registry;
mod window;

pub use backoff::BackoffConfig;
pub use config::{
    BackoffSettings, ChannelConfig, ConfigWarning, RetryConfig, Severity, SibylConfig,
};
pub use executor::RetryExecutor;
pub use governor::{Admission, GovernorStats, RateGovernor, TierStats};
pub use policy::{RetryPolicy, RetryPolicyBuilder};
pub use registry::GovernorRegistry;
pub use window::WindowLimit;
