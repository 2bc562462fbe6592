//! Tracing subscriber setup for the `sibyl` binary and embedding pipelines.

use std::env;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used by [`ObservabilityConfig::verbose`]: governor and parser
/// decisions at debug, dependencies left at info.
const VERBOSE_FILTER: &str = "info,sibyl=debug,sibyl_rate_limit=debug,sibyl_analysis=debug";

/// Configuration for log output.
///
/// # Example
///
/// ```no_run
/// use sibyl::observability::{ObservabilityConfig, init_observability};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// init_observability(&ObservabilityConfig::new("scrape-worker").with_json_logs(true))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit one JSON object per event instead of text
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Info-level text logs for `service_name`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Set the fallback filter directive.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Show every admission, backoff and repair decision when `enabled`.
    pub fn verbose(self, enabled: bool) -> Self {
        if enabled {
            self.with_log_level(VERBOSE_FILTER)
        } else {
            self
        }
    }

    /// Filter from `RUST_LOG`, falling back to the configured level.
    ///
    /// # Errors
    ///
    /// Returns an error if neither is a valid filter directive.
    pub fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        match env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)
                .or_else(|_| EnvFilter::try_new(&self.log_level)),
            _ => EnvFilter::try_new(&self.log_level),
        }
    }
}

/// Install a global subscriber writing to stderr.
///
/// Command output on stdout stays machine-readable.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = config.env_filter()?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        json = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}
