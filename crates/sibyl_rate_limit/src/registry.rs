//! Per-channel governor registry.

use crate::{BackoffConfig, RateGovernor, RetryExecutor, RetryPolicy, SibylConfig};
use sibyl_error::SibylResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Map from channel name to its [`RateGovernor`].
///
/// Governors are created lazily from the configuration the first time a channel
/// is used and then live as long as the registry. Share one registry through an
/// `Arc` to give every caller of a channel the same admission state.
///
/// # Example
///
/// ```no_run
/// use sibyl_rate_limit::{GovernorRegistry, SibylConfig};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Arc::new(GovernorRegistry::new(SibylConfig::load()?)?);
///
/// let scrape = registry.governor("scrape").await;
/// let again = registry.governor("scrape").await;
/// assert!(Arc::ptr_eq(&scrape, &again));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GovernorRegistry {
    config: SibylConfig,
    backoff: BackoffConfig,
    governors: RwLock<HashMap<String, Arc<RateGovernor>>>,
}

impl GovernorRegistry {
    /// Create an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the `[backoff]` section is invalid.
    #[instrument(skip(config))]
    pub fn new(config: SibylConfig) -> SibylResult<Self> {
        let backoff = config.backoff_config()?;
        debug!(channels = config.channels.len(), "Creating governor registry");
        Ok(Self {
            config,
            backoff,
            governors: RwLock::new(HashMap::new()),
        })
    }

    /// Configuration the registry builds governors from.
    pub fn config(&self) -> &SibylConfig {
        &self.config
    }

    /// Governor for `name`, created on first use.
    #[instrument(skip(self))]
    pub async fn governor(&self, name: &str) -> Arc<RateGovernor> {
        if let Some(governor) = self.governors.read().await.get(name) {
            return Arc::clone(governor);
        }

        let mut governors = self.governors.write().await;
        Arc::clone(governors.entry(name.to_string()).or_insert_with(|| {
            debug!(channel = name, "Creating governor on first use");
            Arc::new(RateGovernor::new(
                name,
                self.config.window_limits(name),
                self.backoff,
            ))
        }))
    }

    /// Retry executor bound to the governor for `name`.
    pub async fn executor(&self, name: &str) -> RetryExecutor {
        RetryExecutor::new(self.governor(name).await)
    }

    /// Configured retry schedule for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the applicable retry section is invalid.
    pub fn retry_policy(&self, name: &str) -> SibylResult<RetryPolicy> {
        self.config.retry_policy(name)
    }

    /// Names of channels with a live governor, sorted.
    pub async fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.governors.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop the governor for `name`; the next use starts from fresh state.
    #[instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> Option<Arc<RateGovernor>> {
        self.governors.write().await.remove(name)
    }

    /// Drop every governor.
    #[instrument(skip(self))]
    pub async fn reset(&self) {
        let mut governors = self.governors.write().await;
        debug!(dropped = governors.len(), "Resetting governor registry");
        governors.clear();
    }
}
