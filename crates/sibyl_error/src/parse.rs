//! Structured-response parse error types.

/// Maximum number of characters of raw input echoed into a parse error.
const EXCERPT_CHARS: usize = 500;

/// Reasons a model response could not be turned into a structured result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ParseErrorKind {
    /// Neither a fenced block nor a `{ ... }` span was found
    #[display("No JSON payload found in response")]
    MissingPayload,
    /// Payload was not valid JSON even after repair
    #[display("Invalid JSON after repair: {}", _0)]
    InvalidJson(String),
    /// A required top-level key is absent
    #[display("Missing required field: {}", _0)]
    MissingKey(String),
    /// Categorical code does not match the configured alphabet
    #[display("Invalid type code: {}", _0)]
    InvalidCode(String),
    /// A required field has the wrong JSON type
    #[display("Invalid field {}: {}", name, reason)]
    InvalidField {
        /// Field key
        name: String,
        /// What was wrong with it
        reason: String,
    },
    /// A dimension entry is malformed or out of range
    #[display("Invalid dimension {}: {}", name, reason)]
    InvalidDimension {
        /// Dimension key
        name: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Parse error with the offending input prefix and location tracking.
///
/// # Examples
///
/// ```
/// use sibyl_error::{ParseError, ParseErrorKind};
///
/// let err = ParseError::new(ParseErrorKind::MissingPayload, "Sorry, I cannot help with that.");
/// assert!(format!("{}", err).contains("No JSON payload"));
/// assert_eq!(err.excerpt, "Sorry, I cannot help with that.");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} at line {} in {} (response: {:?})", kind, line, file, excerpt)]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,
    /// Leading characters of the raw response, for diagnostics
    pub excerpt: String,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ParseError {
    /// Create a new ParseError, keeping a truncated prefix of `raw`.
    #[track_caller]
    pub fn new(kind: ParseErrorKind, raw: &str) -> Self {
        let location = std::panic::Location::caller();
        let mut excerpt: String = raw.chars().take(EXCERPT_CHARS).collect();
        if raw.chars().nth(EXCERPT_CHARS).is_some() {
            excerpt.push_str("...");
        }
        Self {
            kind,
            excerpt,
            line: location.line(),
            file: location.file(),
        }
    }
}
