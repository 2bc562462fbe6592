//! Outbound call error types and retry classification.

use std::time::Duration;

/// Classified failure of an outbound call (scraper run, model request, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CallErrorKind {
    /// Remote service signalled rate limiting, optionally with a retry hint
    #[display("Rate limit exceeded: {}", message)]
    RateLimit {
        /// Error message
        message: String,
        /// Server-suggested delay before the next attempt
        retry_after: Option<Duration>,
    },
    /// Requested account or resource does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Resource exists but yielded nothing usable
    #[display("No data: {}", _0)]
    NoData(String),
    /// Transport gave up waiting
    #[display("Timeout: {}", _0)]
    Timeout(String),
    /// Response had an unexpected shape
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// Any other fault
    #[display("{}", _0)]
    Other(String),
}

impl CallErrorKind {
    /// Build a rate-limit kind with an optional server hint.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        CallErrorKind::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Classify a free-form transport error message.
    ///
    /// Transports that only surface strings (actor logs, SDK exceptions) can use
    /// this to recover a kind. Matching is case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use sibyl_error::CallErrorKind;
    ///
    /// let kind = CallErrorKind::classify("HTTP 429 Too Many Requests");
    /// assert!(matches!(kind, CallErrorKind::RateLimit { .. }));
    ///
    /// let kind = CallErrorKind::classify("User not found: @nobody");
    /// assert!(matches!(kind, CallErrorKind::NotFound(_)));
    /// ```
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("rate limit") || lower.contains("429") {
            CallErrorKind::rate_limit(message, None)
        } else if lower.contains("user not found") || lower.contains("does not exist") {
            CallErrorKind::NotFound(message)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            CallErrorKind::Timeout(message)
        } else {
            CallErrorKind::Other(message)
        }
    }

    /// Check if this error type should be retried.
    ///
    /// A missing account or an account without data will not appear on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CallErrorKind::NotFound(_) | CallErrorKind::NoData(_))
    }
}

/// Outbound call error with source location tracking.
///
/// # Examples
///
/// ```
/// use sibyl_error::{CallError, CallErrorKind, RetryableError};
/// use std::time::Duration;
///
/// let err = CallError::new(CallErrorKind::rate_limit("slow down", Some(Duration::from_secs(60))));
/// assert!(err.is_rate_limit());
/// assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Call Error: {} at line {} in {}", kind, line, file)]
pub struct CallError {
    /// The kind of error that occurred
    pub kind: CallErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CallError {
    /// Create a new CallError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CallErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a CallError by classifying a transport message.
    #[track_caller]
    pub fn classify(message: impl Into<String>) -> Self {
        Self::new(CallErrorKind::classify(message))
    }
}

/// Trait for errors that drive retry decisions.
///
/// The retry executor distinguishes three outcomes for a failed attempt:
/// - rate limited (`is_rate_limit`): the governor enters its rate-limit cooldown
///   and the server hint from `retry_after` takes priority over the backoff schedule
/// - retryable (`is_retryable`): generic exponential backoff
/// - fatal: returned to the caller without further attempts
///
/// # Examples
///
/// ```
/// use sibyl_error::{CallError, CallErrorKind, RetryableError};
///
/// let err = CallError::new(CallErrorKind::NotFound("@ghost".into()));
/// assert!(!err.is_retryable());
/// assert!(!err.is_rate_limit());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger another attempt.
    fn is_retryable(&self) -> bool {
        true
    }

    /// Returns true if the remote service explicitly signalled rate limiting.
    fn is_rate_limit(&self) -> bool {
        false
    }

    /// Server-suggested delay before the next attempt, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryableError for CallErrorKind {
    fn is_retryable(&self) -> bool {
        CallErrorKind::is_retryable(self)
    }

    fn is_rate_limit(&self) -> bool {
        matches!(self, CallErrorKind::RateLimit { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CallErrorKind::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl RetryableError for CallError {
    fn is_retryable(&self) -> bool {
        RetryableError::is_retryable(&self.kind)
    }

    fn is_rate_limit(&self) -> bool {
        self.kind.is_rate_limit()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.kind.retry_after()
    }
}
