//! Response repair command handler.

use anyhow::{Context, Result};
use sibyl::{ResponseRepairParser, StructuredResult};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

/// Parse a saved model response and print the structured result as JSON.
#[instrument]
pub async fn repair_response(input: &str, compact: bool) -> Result<()> {
    let raw = read_input(input).await?;
    debug!(bytes = raw.len(), "Read response");

    let result = ResponseRepairParser::default()
        .parse(&raw)
        .with_context(|| format!("Could not recover a structured result from {}", describe(input)))?;

    println!("{}", render(&result, compact)?);
    Ok(())
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read response from stdin")?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read response from {}", input))
    }
}

fn describe(input: &str) -> &str {
    if input == "-" { "stdin" } else { input }
}

fn render(result: &StructuredResult, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(result)
    } else {
        serde_json::to_string_pretty(result)
    };
    json.context("Failed to serialize result")
}
