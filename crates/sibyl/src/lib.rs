//! Sibyl - governed outbound calls and structured response recovery
//!
//! Scrape-then-infer pipelines call two kinds of rate-limited services: a
//! scraping API and a language-model API. Sibyl puts every such call behind a
//! per-channel governor with retry, and turns the model's semi-structured reply
//! into a validated [`StructuredResult`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sibyl::{CallError, Sibyl, SibylConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sibyl = Sibyl::new(SibylConfig::load()?)?;
//!
//!     let tweets = sibyl
//!         .call("scrape", || async { scraper.timeline("@someone").await })
//!         .await?;
//!
//!     let analysis = sibyl
//!         .analyze("inference", || async { model.generate(&prompt(&tweets)).await })
//!         .await?;
//!     println!("{}: {}", analysis.code(), analysis.summary());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Sibyl is organized as a workspace with focused crates:
//!
//! - `sibyl_error` - Error types and retry classification
//! - `sibyl_rate_limit` - Sliding-window governor, retry executor, configuration
//! - `sibyl_analysis` - Payload extraction, JSON repair and validation
//!
//! This crate (`sibyl`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod observability;
mod service;

pub use service::Sibyl;

// Re-export error types
pub use sibyl_error::{
    CallError, CallErrorKind, ConfigError, ParseError, ParseErrorKind, RetryableError,
    SibylError, SibylErrorKind, SibylResult,
};

// Re-export call governance
pub use sibyl_rate_limit::{
    Admission, BackoffConfig, BackoffSettings, ChannelConfig, ConfigWarning, GovernorRegistry,
    GovernorStats, RateGovernor, RetryConfig, RetryExecutor, RetryPolicy, RetryPolicyBuilder,
    Severity, SibylConfig, TierStats, WindowLimit,
};

// Re-export response analysis
pub use sibyl_analysis::{
    CodeAlphabet, Dimension, JsonRepair, ParserConfig, ParserConfigBuilder,
    ResponseRepairParser, StructuredResult, locate_payload,
};
