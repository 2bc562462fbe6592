//! Error types for the Sibyl library.
//!
//! This crate provides the foundation error types used throughout the Sibyl workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Outbound call failures additionally implement [`RetryableError`], which is how
//! the retry executor decides between rate-limit handling, generic backoff, and
//! failing fast.
//!
//! # Examples
//!
//! ```
//! use sibyl_error::{CallError, CallErrorKind, SibylResult};
//!
//! fn fetch_timeline() -> SibylResult<String> {
//!     Err(CallError::new(CallErrorKind::Timeout("actor run exceeded 120s".into())))?
//! }
//!
//! match fetch_timeline() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod call;
mod config;
mod error;
mod parse;

pub use call::{CallError, CallErrorKind, RetryableError};
pub use config::ConfigError;
pub use error::{SibylError, SibylErrorKind, SibylResult};
pub use parse::{ParseError, ParseErrorKind};
