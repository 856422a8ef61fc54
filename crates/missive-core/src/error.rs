//! Error types for Missive.
//!
//! This module provides [`MissiveError`], the error type shared by every
//! stage of response construction and delivery. Only registration errors are
//! ever returned to callers of the delivery API; the rest are recovered
//! locally by substituting a safe response and recording a trace entry.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`MissiveError`].
pub type MissiveResult<T> = Result<T, MissiveError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed configuration input.
    Config,
    /// Caller-supplied field errors.
    Validation,
    /// Encoded response larger than the configured limit.
    SizeLimit,
    /// Response body could not be encoded or written.
    Encoding,
    /// A received envelope could not be decoded.
    Decoding,
    /// Interceptor registry is full.
    InterceptorLimit,
    /// Status code outside of [100, 599].
    StatusCode,
}

impl ErrorCategory {
    /// Returns the status code a response substituted for this error carries.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Decoding => StatusCode::BAD_GATEWAY,
            Self::Config
            | Self::SizeLimit
            | Self::Encoding
            | Self::InterceptorLimit
            | Self::StatusCode => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Missive.
///
/// # Example
///
/// ```
/// use missive_core::{ErrorCategory, MissiveError};
///
/// let err = MissiveError::SizeLimitExceeded { size: 2048, max: 1024 };
/// assert_eq!(err.category(), ErrorCategory::SizeLimit);
/// assert_eq!(
///     err.to_string(),
///     "response size (2048 bytes) exceeds limit (1024 bytes)"
/// );
/// ```
#[derive(Error, Debug)]
pub enum MissiveError {
    /// A configuration field could not be parsed.
    #[error("invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A caller-supplied field failed validation.
    #[error("validation failed on '{field}': {message} (value={value})")]
    Validation {
        /// The field that failed.
        field: String,
        /// Human-readable message.
        message: String,
        /// The rejected value, rendered as text.
        value: String,
    },

    /// The encoded response exceeds the configured size limit.
    #[error("response size ({size} bytes) exceeds limit ({max} bytes)")]
    SizeLimitExceeded {
        /// Estimated encoded size in bytes.
        size: usize,
        /// The configured limit in bytes.
        max: usize,
    },

    /// The response could not be encoded or written to its destination.
    #[error("encoding failed: {reason}")]
    Encoding {
        /// Description of the underlying failure.
        reason: String,
    },

    /// A received envelope body could not be decoded.
    #[error("decoding failed: {0}")]
    Decoding(#[source] serde_json::Error),

    /// The interceptor registry already holds the maximum number of entries.
    #[error("maximum number of interceptors reached: {current}/{max}")]
    InterceptorLimitExceeded {
        /// Interceptors registered at the time of the call.
        current: usize,
        /// The configured maximum.
        max: usize,
    },

    /// An explicit status code fell outside of [100, 599].
    #[error("invalid HTTP status code: {code}")]
    InvalidStatusCode {
        /// The rejected code.
        code: u16,
    },
}

impl MissiveError {
    /// Creates an encoding error from any displayable cause.
    pub fn encoding(cause: impl std::fmt::Display) -> Self {
        Self::Encoding {
            reason: cause.to_string(),
        }
    }

    /// Creates a configuration error for a field.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigInvalid { .. } => ErrorCategory::Config,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::SizeLimitExceeded { .. } => ErrorCategory::SizeLimit,
            Self::Encoding { .. } => ErrorCategory::Encoding,
            Self::Decoding(_) => ErrorCategory::Decoding,
            Self::InterceptorLimitExceeded { .. } => ErrorCategory::InterceptorLimit,
            Self::InvalidStatusCode { .. } => ErrorCategory::StatusCode,
        }
    }

    /// Returns the HTTP status code associated with this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interceptor_limit_display() {
        let err = MissiveError::InterceptorLimitExceeded { current: 3, max: 3 };
        assert_eq!(err.to_string(), "maximum number of interceptors reached: 3/3");
        assert_eq!(err.category(), ErrorCategory::InterceptorLimit);
    }

    #[test]
    fn test_invalid_status_code_display() {
        let err = MissiveError::InvalidStatusCode { code: 700 };
        assert_eq!(err.to_string(), "invalid HTTP status code: 700");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_encoding_from_display() {
        let err = MissiveError::encoding("broken pipe");
        assert_eq!(err.to_string(), "encoding failed: broken pipe");
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = MissiveError::Validation {
            field: "email".to_string(),
            message: "must not be empty".to_string(),
            value: "\"\"".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("'email'"));
    }

    #[test]
    fn test_decoding_wraps_serde_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = MissiveError::Decoding(source);
        assert_eq!(err.category(), ErrorCategory::Decoding);
        assert!(std::error::Error::source(&err).is_some());
    }
}
