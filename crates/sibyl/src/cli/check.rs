//! Configuration check command handler.

use anyhow::{Context, Result, bail};
use sibyl::{ConfigWarning, Severity, SibylConfig};
use std::path::Path;
use tracing::{info, instrument};

/// Validate the merged configuration and print every finding.
///
/// Fails when any finding is error-level, so the command can gate deploys.
#[instrument]
pub fn check_config(config: Option<&Path>, print: bool) -> Result<()> {
    let config = SibylConfig::load_with(config).context("Failed to load configuration")?;

    if print {
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration as TOML")?;
        println!("{}", rendered);
    }

    let findings = config.validate();
    for finding in &findings {
        println!("{}", finding);
    }

    let errors = count(&findings, Severity::Error);
    let warnings = count(&findings, Severity::Warning);
    info!(errors, warnings, channels = config.channels.len(), "Configuration checked");

    if errors > 0 {
        bail!("Configuration has {} error(s) and {} warning(s)", errors, warnings);
    }
    println!(
        "Configuration OK: {} channel(s), {} warning(s)",
        config.channels.len(),
        warnings
    );
    Ok(())
}

fn count(findings: &[ConfigWarning], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}
