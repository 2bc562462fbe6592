//! Structured-response recovery for language-model output.
//!
//! Model responses are expected to embed a JSON payload describing a
//! personality-type code, per-dimension scores with commentary, and a summary.
//! In practice the payload arrives wrapped in markdown fences, surrounded by
//! prose, or broken by raw newlines inside strings and missing or trailing
//! commas. [`ResponseRepairParser`] finds the payload, repairs it once if a
//! strict parse fails, and validates it into a [`StructuredResult`].
//!
//! # Example
//!
//! ```
//! use sibyl_analysis::ResponseRepairParser;
//!
//! let raw = "Here is the analysis:\n```json\n{\"mbti_type\": \"INTJ\", \"dimensions\": {}, \"overall_analysis\": \"x\"}\n```";
//! let result = ResponseRepairParser::default().parse(raw).unwrap();
//! assert_eq!(result.code(), "INTJ");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod extraction;
mod parser;
mod repair;
mod result;

pub use config::{CodeAlphabet, ParserConfig, ParserConfigBuilder};
pub use extraction::locate_payload;
pub use parser::ResponseRepairParser;
pub use repair::JsonRepair;
pub use result::{Dimension, StructuredResult};
