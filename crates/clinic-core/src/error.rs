//! Error types for clinic analytics
//!
//! Provides the error taxonomy shared by every clinic-analytics crate. Schema
//! and input errors are raised before any merge or aggregation work starts.

use crate::schema::FileRole;
use thiserror::Error;

/// Core error type for analysis runs
#[derive(Error, Debug)]
pub enum Error {
    /// The requested analysis key is not registered
    #[error("Unknown analysis: {0}")]
    UnknownAnalysis(String),

    /// A required input file could not be fetched
    #[error("Missing input file for role '{role}'")]
    MissingInputFile { role: FileRole },

    /// An uploaded file lacks required columns
    #[error("Missing required columns in {role} file: {}", missing.join(", "))]
    MissingColumns { role: FileRole, missing: Vec<String> },

    /// A declared date column holds a value that is not a date
    #[error("Malformed date in {role} column '{column}': '{value}'")]
    MalformedDate {
        role: FileRole,
        column: String,
        value: String,
    },

    /// A date range bound could not be parsed or the bounds are inverted
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Serializing or storing a named result failed
    #[error("Failed to write result '{name}': {cause}")]
    WriteError { name: String, cause: String },

    /// An analysis definition is internally inconsistent
    #[error("Invalid analysis definition '{key}': {reason}")]
    InvalidDefinition { key: String, reason: String },

    /// Two definitions were registered under the same key
    #[error("Duplicate analysis key: {0}")]
    DuplicateAnalysis(String),

    /// Registry configuration could not be decoded
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error (for configuration files and run workspaces)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for an inconsistent definition
    pub fn invalid_definition(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a write error from any displayable cause
    pub fn write_failed(name: &str, cause: impl std::fmt::Display) -> Self {
        Self::WriteError {
            name: name.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Whether this error was raised while validating schema or inputs,
    /// i.e. before any dataset work began
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownAnalysis(_)
                | Self::MissingInputFile { .. }
                | Self::MissingColumns { .. }
                | Self::MalformedDate { .. }
                | Self::InvalidDateRange(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownAnalysis("nonexistent".to_string());
        assert_eq!(err.to_string(), "Unknown analysis: nonexistent");

        let err = Error::MissingInputFile {
            role: FileRole::Visits,
        };
        assert_eq!(err.to_string(), "Missing input file for role 'visits'");

        let err = Error::MissingColumns {
            role: FileRole::Metrics,
            missing: vec!["pain_score".to_string(), "mobility_score".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns in metrics file: pain_score, mobility_score"
        );

        let err = Error::MalformedDate {
            role: FileRole::Patients,
            column: "dob".to_string(),
            value: "yesterday".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed date in patients column 'dob': 'yesterday'"
        );

        let err = Error::write_failed("revenue_by_city", "disk full");
        assert_eq!(
            err.to_string(),
            "Failed to write result 'revenue_by_city': disk full"
        );
    }

    #[test]
    fn test_input_error_classification() {
        assert!(Error::UnknownAnalysis("x".into()).is_input_error());
        assert!(Error::InvalidDateRange("bad".into()).is_input_error());
        assert!(!Error::write_failed("x", "y").is_input_error());
        assert!(!Error::DuplicateAnalysis("x".into()).is_input_error());
    }

    #[test]
    fn test_error_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => assert!(err.to_string().contains("file not found")),
            _ => panic!("Wrong error type"),
        }
    }
}
