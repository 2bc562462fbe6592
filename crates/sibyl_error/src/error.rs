//! Top-level error wrapper types.

use crate::{CallError, ConfigError, ParseError};

/// Union of every error the workspace produces.
///
/// # Examples
///
/// ```
/// use sibyl_error::{SibylError, ConfigError};
///
/// let config_err = ConfigError::new("missing [defaults] table");
/// let err: SibylError = config_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum SibylErrorKind {
    /// Outbound call failure
    #[from(CallError)]
    Call(CallError),
    /// Structured response could not be recovered
    #[from(ParseError)]
    Parse(ParseError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Sibyl error with kind discrimination.
///
/// # Examples
///
/// ```
/// use sibyl_error::{SibylErrorKind, SibylResult, ConfigError};
///
/// fn might_fail() -> SibylResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), SibylErrorKind::Config(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Sibyl Error: {}", _0)]
pub struct SibylError(Box<SibylErrorKind>);

impl SibylError {
    /// Create a new error from a kind.
    pub fn new(kind: SibylErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SibylErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to SibylErrorKind
impl<T> From<T> for SibylError
where
    T: Into<SibylErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Sibyl operations.
pub type SibylResult<T> = std::result::Result<T, SibylError>;
