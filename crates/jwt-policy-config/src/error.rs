//! Error types for policy validation.

use thiserror::Error;

/// Errors raised while validating a policy update.
///
/// Both variants are request-scoped: the store is left exactly as it was
/// before the rejected update.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A duration-typed field could not be parsed or was not positive.
    #[error("invalid duration for '{field}': {reason}")]
    InvalidDuration {
        /// Wire name of the offending field.
        field: &'static str,
        /// Value supplied by the caller.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A pattern-typed field did not compile as a regular expression.
    #[error("invalid pattern for '{field}'")]
    InvalidPattern {
        /// Wire name of the offending field.
        field: &'static str,
        /// Pattern source supplied by the caller.
        value: String,
        /// Underlying regex compilation error.
        source: regex::Error,
    },
}

impl PolicyError {
    /// Wire name of the field that failed validation.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidDuration { field, .. } | Self::InvalidPattern { field, .. } => field,
        }
    }

    /// Value that was rejected, as supplied by the caller.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::InvalidDuration { value, .. } | Self::InvalidPattern { value, .. } => value,
        }
    }
}

/// Convenience alias for policy results.
pub type PolicyResult<T> = Result<T, PolicyError>;
