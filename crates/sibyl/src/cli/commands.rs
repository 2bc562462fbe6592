//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sibyl - governed outbound calls and structured response recovery
#[derive(Parser, Debug)]
#[command(name = "sibyl")]
#[command(about = "Governed outbound calls and structured response recovery", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Extra configuration file, layered above ./sibyl.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recover a structured result from a saved model response
    Repair {
        /// File holding the raw response, or `-` for stdin
        input: String,

        /// Print the result on one line
        #[arg(long)]
        compact: bool,
    },

    /// Show tiers and retry schedule per channel
    Limits {
        /// Only show this channel (unknown names show the defaults)
        #[arg(long)]
        channel: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Validate configuration and report findings
    CheckConfig {
        /// Also print the effective merged configuration as TOML
        #[arg(long)]
        print: bool,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repair_from_stdin() {
        let cli = Cli::try_parse_from(["sibyl", "repair", "-"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Repair { ref input, compact: false } if input == "-"
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sibyl",
            "limits",
            "--channel",
            "inference",
            "--format",
            "json",
            "--config",
            "custom.toml",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Limits { channel, format } => {
                assert_eq!(channel.as_deref(), Some("inference"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_config_flags() {
        let cli = Cli::try_parse_from(["sibyl", "--json-logs", "check-config", "--print"]).unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::CheckConfig { print: true }));
    }
}
