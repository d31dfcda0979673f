//! Error types for `example_filter`.
//!
//! Filtering itself never fails: unsupported expectations degrade to "no
//! match". Errors only surface from the layers around the engine, such as
//! loading filter configuration, compiling patterns and validating
//! declarations.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Every variant maps to a stable [`ErrorCode`]
//! - Distinguishes user-fixable errors from internal ones

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `example_filter` operations.
#[derive(Error, Debug)]
pub enum SelectError {
    // === Configuration Errors ===
    /// Configuration file or environment value could not be interpreted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file exists but could not be parsed.
    #[error("Invalid configuration file '{path}': {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// A `/.../` pattern literal did not compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A filter value has a shape that cannot be expressed as an expectation.
    #[error("Unsupported filter value for '{key}': {reason}")]
    UnsupportedFilterValue { key: String, reason: String },

    // === Declaration Errors ===
    /// A group or case declaration failed validation.
    #[error("Invalid declaration: {}", join_errors(.errors))]
    Validation { errors: Vec<ValidationError> },

    // === Logging ===
    /// The tracing subscriber could not be installed.
    #[error("Logging initialization failed: {0}")]
    Logging(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A single declaration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigError,
    InvalidPattern,
    UnsupportedFilterValue,
    InvalidDeclaration,
    LoggingError,
    IoError,
    SerializationError,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::InvalidPattern => "INVALID_PATTERN",
            Self::UnsupportedFilterValue => "UNSUPPORTED_FILTER_VALUE",
            Self::InvalidDeclaration => "INVALID_DECLARATION",
            Self::LoggingError => "LOGGING_ERROR",
            Self::IoError => "IO_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SelectError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) | Self::ConfigFile { .. } => ErrorCode::ConfigError,
            Self::InvalidPattern { .. } => ErrorCode::InvalidPattern,
            Self::UnsupportedFilterValue { .. } => ErrorCode::UnsupportedFilterValue,
            Self::Validation { .. } => ErrorCode::InvalidDeclaration,
            Self::Logging(_) => ErrorCode::LoggingError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::SerializationError,
        }
    }

    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigFile { .. }
                | Self::InvalidPattern { .. }
                | Self::UnsupportedFilterValue { .. }
                | Self::Validation { .. }
                | Self::Yaml(_)
        )
    }

    /// Build a validation error for a single field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![ValidationError::new(field, message)],
        }
    }

    /// Build an unsupported-value error for a filter key.
    #[must_use]
    pub fn unsupported(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFilterValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using [`SelectError`].
pub type Result<T> = std::result::Result<T, SelectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = SelectError::Config("bad".to_string());
        assert_eq!(err.code(), ErrorCode::ConfigError);
        assert_eq!(err.code().as_str(), "CONFIG_ERROR");

        let err = SelectError::validation("description", "cannot be empty");
        assert_eq!(err.code(), ErrorCode::InvalidDeclaration);
        assert_eq!(
            err.to_string(),
            "Invalid declaration: description: cannot be empty"
        );

        let err = SelectError::Validation {
            errors: vec![
                ValidationError::new("description", "cannot be empty"),
                ValidationError::new("metadata", "reserved key"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Invalid declaration: description: cannot be empty; metadata: reserved key"
        );
    }

    #[test]
    fn recoverable_classification() {
        assert!(SelectError::unsupported("color", "null").is_user_recoverable());
        assert!(!SelectError::Logging("already set".to_string()).is_user_recoverable());
        let io = SelectError::from(std::io::Error::other("boom"));
        assert!(!io.is_user_recoverable());
        assert_eq!(io.code(), ErrorCode::IoError);
    }

    #[test]
    fn code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::InvalidPattern).unwrap();
        assert_eq!(json, "\"INVALID_PATTERN\"");
    }
}
