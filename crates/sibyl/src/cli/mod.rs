//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the sibyl binary.

mod check;
mod commands;
mod limits;
mod repair;

pub use check::check_config;
pub use commands::{Cli, Commands};
pub use limits::show_limits;
pub use repair::repair_response;
