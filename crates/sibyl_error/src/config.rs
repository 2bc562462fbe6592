//! Configuration error types.

/// Rejected governance setting, with the location that rejected it.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What is wrong, naming the offending setting
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a ConfigError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Reject the setting `field` because of `reason`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sibyl_error::{ConfigError, SibylError};
    ///
    /// let err = ConfigError::invalid_field("backoff_factor", "must be finite and >= 1.0, got 0.5");
    /// assert_eq!(err.message, "backoff_factor must be finite and >= 1.0, got 0.5");
    ///
    /// let err: SibylError = err.into();
    /// assert!(err.to_string().contains("Configuration Error: backoff_factor"));
    /// ```
    #[track_caller]
    pub fn invalid_field(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(format!("{} {}", field, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_is_the_rejecting_call_site() {
        let line = line!() + 1;
        let err = ConfigError::invalid_field("rpm", "is zero");
        assert_eq!(err.line, line);
        assert!(err.file.ends_with("config.rs"));
        assert_eq!(err.message, "rpm is zero");
    }
}
