//! Sibyl CLI binary.
//!
//! This binary provides operator access to Sibyl's functionality:
//! - Repair and validate a saved model response
//! - Inspect the tiers and retry schedules each channel will use
//! - Check configuration files for mistakes

use anyhow::Result;
use clap::Parser;
use sibyl::observability::{ObservabilityConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    use cli::{Cli, Commands, check_config, repair_response, show_limits};

    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let observability = ObservabilityConfig::new("sibyl")
        .with_json_logs(cli.json_logs)
        .verbose(cli.verbose);
    init_observability(&observability)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Repair { input, compact } => {
            repair_response(&input, compact).await?;
        }

        Commands::Limits { channel, format } => {
            show_limits(cli.config.as_deref(), channel.as_deref(), format)?;
        }

        Commands::CheckConfig { print } => {
            check_config(cli.config.as_deref(), print)?;
        }
    }

    Ok(())
}
