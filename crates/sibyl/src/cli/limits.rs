//! Channel limits command handler.

use super::commands::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;
use sibyl::{SibylConfig, WindowLimit};
use std::path::Path;
use tracing::instrument;

/// Effective governance settings for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChannelSummary {
    channel: String,
    tiers: Vec<TierSummary>,
    max_retries: u32,
    initial_delay_secs: f64,
    backoff_factor: f64,
    max_delay_secs: f64,
    worst_case_wait_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct TierSummary {
    label: String,
    max_calls: u32,
    window_secs: u64,
}

impl From<&WindowLimit> for TierSummary {
    fn from(limit: &WindowLimit) -> Self {
        Self {
            label: limit.label().clone(),
            max_calls: *limit.max_calls(),
            window_secs: limit.window().as_secs(),
        }
    }
}

/// Print tiers and retry schedule for every configured channel, or one.
#[instrument]
pub fn show_limits(config: Option<&Path>, channel: Option<&str>, format: OutputFormat) -> Result<()> {
    let config = SibylConfig::load_with(config).context("Failed to load configuration")?;
    let summaries = summarize(&config, channel)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summaries)
                .context("Failed to serialize channel limits")?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            for summary in &summaries {
                print_human(summary);
            }
        }
    }

    Ok(())
}

fn summarize(config: &SibylConfig, only: Option<&str>) -> Result<Vec<ChannelSummary>> {
    let names: Vec<&str> = match only {
        Some(name) => vec![name],
        None => config.channels.keys().map(String::as_str).collect(),
    };

    names
        .into_iter()
        .map(|name| -> Result<ChannelSummary> {
            let policy = config
                .retry_policy(name)
                .with_context(|| format!("Invalid retry settings for channel '{}'", name))?;
            Ok(ChannelSummary {
                channel: name.to_string(),
                tiers: config.window_limits(name).iter().map(TierSummary::from).collect(),
                max_retries: *policy.max_retries(),
                initial_delay_secs: policy.initial_delay().as_secs_f64(),
                backoff_factor: *policy.backoff_factor(),
                max_delay_secs: policy.max_delay().as_secs_f64(),
                worst_case_wait_secs: policy.worst_case_wait().as_secs_f64(),
            })
        })
        .collect()
}

fn print_human(summary: &ChannelSummary) {
    println!("Channel '{}':", summary.channel);
    if summary.tiers.is_empty() {
        println!("  Tiers: none (unlimited)");
    }
    for tier in &summary.tiers {
        println!(
            "  {:<8} {:>7} calls / {}s",
            tier.label, tier.max_calls, tier.window_secs
        );
    }
    println!(
        "  Retry:   {} retries, {:.1}s initial, x{:.1}, capped at {:.1}s (worst case {:.1}s)",
        summary.max_retries,
        summary.initial_delay_secs,
        summary.backoff_factor,
        summary.max_delay_secs,
        summary.worst_case_wait_secs
    );
    println!("{:-<80}", "");
}
