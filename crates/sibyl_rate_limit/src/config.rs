//! Configuration structures for call governance.
//!
//! This module provides TOML-based configuration for channel tiers, cooldowns and
//! retry schedules. The configuration system supports:
//! - Bundled defaults (include_str! from sibyl.toml)
//! - User overrides (~/.config/sibyl/sibyl.toml, then ./sibyl.toml)
//! - Environment overrides (`SIBYL__CHANNELS__SCRAPE__RPM=30`)
//! - Validation that flags inconsistent tiers and aggressive retry schedules

use crate::{BackoffConfig, RetryPolicy, WindowLimit};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sibyl_error::{ConfigError, SibylError, SibylResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../sibyl.toml");

/// Longest total retry wait that does not raise a warning.
const RETRY_WAIT_WARNING: Duration = Duration::from_secs(300);

/// Upper bound for any `[backoff]` value.
const MAX_COOLDOWN: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tiers and retry override for one channel.
///
/// `None` for a tier means the channel has no limit at that granularity.
///
/// ```toml
/// [channels.inference]
/// rpm = 60
/// rpd = 1500
///
/// [channels.inference.retry]
/// initial_delay_secs = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ChannelConfig {
    /// Requests per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,

    /// Requests per hour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rph: Option<u32>,

    /// Requests per day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpd: Option<u32>,

    /// Retry schedule override for this channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl ChannelConfig {
    /// Tiers for this channel, ascending by window.
    pub fn window_limits(&self) -> Vec<WindowLimit> {
        let mut limits = Vec::with_capacity(3);
        if let Some(rpm) = self.rpm {
            limits.push(WindowLimit::per_minute(rpm));
        }
        if let Some(rph) = self.rph {
            limits.push(WindowLimit::per_hour(rph));
        }
        if let Some(rpd) = self.rpd {
            limits.push(WindowLimit::per_day(rpd));
        }
        limits
    }
}

/// Retry schedule as written in TOML (delays in seconds).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,

    /// Multiplier applied after every retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Cap for any single wait
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_secs() -> f64 {
    1.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_secs() -> f64 {
    60.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_secs: default_initial_delay_secs(),
            backoff_factor: default_backoff_factor(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl RetryConfig {
    /// Convert to a validated [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite delays and for schedules
    /// rejected by [`RetryPolicy::validate`].
    pub fn to_policy(&self) -> SibylResult<RetryPolicy> {
        let policy = RetryPolicy::builder()
            .max_retries(self.max_retries)
            .initial_delay(seconds("initial_delay_secs", self.initial_delay_secs)?)
            .backoff_factor(self.backoff_factor)
            .max_delay(seconds("max_delay_secs", self.max_delay_secs)?)
            .build();
        policy.validate()?;
        Ok(policy)
    }
}

/// Cooldown schedule as written in TOML (seconds).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackoffSettings {
    /// Cap for the exponential failure cooldown
    #[serde(default = "default_failure_cap_secs")]
    pub failure_cap_secs: f64,

    /// Linear step for unhinted rate-limit cooldowns
    #[serde(default = "default_rate_limit_step_secs")]
    pub rate_limit_step_secs: f64,

    /// Cap for unhinted rate-limit cooldowns
    #[serde(default = "default_rate_limit_cap_secs")]
    pub rate_limit_cap_secs: f64,
}

fn default_failure_cap_secs() -> f64 {
    300.0
}

fn default_rate_limit_step_secs() -> f64 {
    30.0
}

fn default_rate_limit_cap_secs() -> f64 {
    600.0
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            failure_cap_secs: default_failure_cap_secs(),
            rate_limit_step_secs: default_rate_limit_step_secs(),
            rate_limit_cap_secs: default_rate_limit_cap_secs(),
        }
    }
}

impl BackoffSettings {
    /// Convert to a [`BackoffConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error for negative or non-finite values and for values above
    /// one week.
    pub fn to_backoff(&self) -> SibylResult<BackoffConfig> {
        Ok(BackoffConfig {
            failure_cap: cooldown("failure_cap_secs", self.failure_cap_secs)?,
            rate_limit_step: cooldown("rate_limit_step_secs", self.rate_limit_step_secs)?,
            rate_limit_cap: cooldown("rate_limit_cap_secs", self.rate_limit_cap_secs)?,
        })
    }
}

fn cooldown(field: &str, value: f64) -> SibylResult<Duration> {
    let duration = seconds(field, value)?;
    if duration > MAX_COOLDOWN {
        return Err(SibylError::from(ConfigError::invalid_field(
            field,
            format!("must be at most {} seconds, got {}", MAX_COOLDOWN.as_secs(), value),
        )));
    }
    Ok(duration)
}

fn seconds(field: &str, value: f64) -> SibylResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        SibylError::from(ConfigError::invalid_field(
            field,
            format!("must be a non-negative number of seconds, got {}: {}", value, e),
        ))
    })
}

/// Severity of a configuration finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Works, but probably not what was intended
    Warning,
    /// Will not work
    Error,
}

/// A finding from [`SibylConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{} [{}]: {}", severity, subject, message)]
pub struct ConfigWarning {
    /// How serious the finding is
    pub severity: Severity,
    /// Which section it concerns ("defaults", "channels.scrape", ...)
    pub subject: String,
    /// Human-readable description
    pub message: String,
}

impl ConfigWarning {
    fn new(severity: Severity, subject: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            subject: subject.to_string(),
            message: message.into(),
        }
    }
}

/// Top-level Sibyl configuration.
///
/// Loads governance settings from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from sibyl.toml)
/// 2. User config in home directory (~/.config/sibyl/sibyl.toml)
/// 3. User config in current directory (./sibyl.toml)
/// 4. Environment variables prefixed with `SIBYL__`
///
/// # Example
///
/// ```no_run
/// use sibyl_rate_limit::SibylConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SibylConfig::load()?;
///
/// let tiers = config.window_limits("scrape");
/// let policy = config.retry_policy("inference")?;
/// println!("{} tiers, {} retries", tiers.len(), policy.max_retries());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SibylConfig {
    /// Tiers for channels without their own section
    #[serde(default = "default_channel")]
    pub defaults: ChannelConfig,

    /// Cooldown schedule shared by every governor
    #[serde(default)]
    pub backoff: BackoffSettings,

    /// Retry schedule for channels without an override
    #[serde(default)]
    pub retry: RetryConfig,

    /// Named channels
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

fn default_channel() -> ChannelConfig {
    ChannelConfig {
        rpm: Some(60),
        rph: Some(1000),
        rpd: Some(10_000),
        retry: None,
    }
}

impl Default for SibylConfig {
    fn default() -> Self {
        Self {
            defaults: default_channel(),
            backoff: BackoffSettings::default(),
            retry: RetryConfig::default(),
            channels: BTreeMap::new(),
        }
    }
}

impl SibylConfig {
    /// Load configuration from a specific file path.
    ///
    /// Unspecified sections take their built-in defaults, not the bundled file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> SibylResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                SibylError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                SibylError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: env > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed.
    #[instrument]
    pub fn load() -> SibylResult<Self> {
        Self::load_with(None)
    }

    /// Like [`load`](Self::load), with an extra required file layered above the
    /// current-directory config.
    ///
    /// # Errors
    ///
    /// Returns an error if `extra` is missing or any source fails to parse.
    #[instrument]
    pub fn load_with(extra: Option<&Path>) -> SibylResult<Self> {
        debug!("Loading configuration with precedence: env > explicit > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/sibyl/sibyl.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("sibyl").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("SIBYL")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .map_err(|e| {
                SibylError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                SibylError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Settings for a channel, falling back to `[defaults]` for unknown names.
    pub fn channel(&self, name: &str) -> &ChannelConfig {
        self.channels.get(name).unwrap_or(&self.defaults)
    }

    /// Tiers for a channel.
    pub fn window_limits(&self, name: &str) -> Vec<WindowLimit> {
        self.channel(name).window_limits()
    }

    /// Retry schedule for a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the applicable retry section is invalid.
    pub fn retry_policy(&self, name: &str) -> SibylResult<RetryPolicy> {
        self.channel(name)
            .retry
            .as_ref()
            .unwrap_or(&self.retry)
            .to_policy()
    }

    /// Shared cooldown schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the `[backoff]` section is invalid.
    pub fn backoff_config(&self) -> SibylResult<BackoffConfig> {
        self.backoff.to_backoff()
    }

    /// Check the configuration for mistakes and inconsistencies.
    ///
    /// Errors are settings that cannot work (zero limits, invalid durations).
    /// Warnings flag tiers that can never be reached (a per-minute limit above
    /// the hourly budget spread over an hour) and retry schedules whose
    /// unclamped exponential wait exceeds five minutes.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut findings = Vec::new();

        if let Err(e) = self.backoff.to_backoff() {
            findings.push(ConfigWarning::new(Severity::Error, "backoff", e.to_string()));
        }

        check_channel("defaults", &self.defaults, &mut findings);
        check_retry("retry", &self.retry, &mut findings);

        for (name, channel) in &self.channels {
            let subject = format!("channels.{}", name);
            check_channel(&subject, channel, &mut findings);
            if let Some(retry) = &channel.retry {
                check_retry(&format!("{}.retry", subject), retry, &mut findings);
            }
        }

        findings
    }
}

fn check_channel(subject: &str, channel: &ChannelConfig, findings: &mut Vec<ConfigWarning>) {
    for (label, value) in [("rpm", channel.rpm), ("rph", channel.rph), ("rpd", channel.rpd)] {
        if value == Some(0) {
            findings.push(ConfigWarning::new(
                Severity::Error,
                subject,
                format!("{} is zero, the channel would never admit a call", label),
            ));
        }
    }

    if let (Some(rpm), Some(rph)) = (channel.rpm, channel.rph) {
        if f64::from(rpm) > f64::from(rph) / 60.0 {
            findings.push(ConfigWarning::new(
                Severity::Warning,
                subject,
                format!("rpm {} exceeds rph/60 ({:.1}); bursts will hit the hourly tier", rpm, f64::from(rph) / 60.0),
            ));
        }
    }

    if let (Some(rph), Some(rpd)) = (channel.rph, channel.rpd) {
        if f64::from(rph) > f64::from(rpd) / 24.0 {
            findings.push(ConfigWarning::new(
                Severity::Warning,
                subject,
                format!("rph {} exceeds rpd/24 ({:.1}); bursts will hit the daily tier", rph, f64::from(rpd) / 24.0),
            ));
        }
    }
}

fn check_retry(subject: &str, retry: &RetryConfig, findings: &mut Vec<ConfigWarning>) {
    if let Err(e) = retry.to_policy() {
        findings.push(ConfigWarning::new(Severity::Error, subject, e.to_string()));
        return;
    }

    let worst = retry.initial_delay_secs * 2f64.powi(retry.max_retries.min(64) as i32);
    if worst > RETRY_WAIT_WARNING.as_secs_f64() {
        findings.push(ConfigWarning::new(
            Severity::Warning,
            subject,
            format!(
                "initial_delay_secs * 2^max_retries = {:.0}s exceeds {}s",
                worst,
                RETRY_WAIT_WARNING.as_secs()
            ),
        ));
    }
}
