//! Error types for fixture storage

use mockapi_protocol::ProtocolError;
use thiserror::Error;

use crate::template::TemplateError;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while persisting or resolving fixtures
#[derive(Debug, Error)]
pub enum StoreError {
    // Lookup errors
    /// No fixture is stored under the requested key
    #[error("Mock data not found: {0}")]
    NotFound(String),

    /// Several files share the requested key stem
    #[error("More than one result found: {}", matches.join(","))]
    Ambiguous {
        /// Key that was looked up
        key: String,
        /// Every file name matching the key
        matches: Vec<String>,
    },

    // Input errors
    /// File name is empty or escapes the data directory
    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),

    /// Declaration rejected before anything was written
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    // Storage errors
    /// Data directory is missing or not a directory
    #[error("Invalid data directory: {0}")]
    InvalidDirectory(String),

    /// Stored bytes do not match their declared kind
    #[error("Corrupt fixture {file}: {reason}")]
    Corrupt {
        /// File that failed to decode
        file: String,
        /// Decoder message
        reason: String,
    },

    /// Template rendering failed
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error
    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl StoreError {
    /// Create a new `NotFound` error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new `InvalidFileName` error
    pub fn invalid_file_name(name: impl Into<String>) -> Self {
        Self::InvalidFileName(name.into())
    }

    /// Create a new `InvalidDirectory` error
    pub fn invalid_directory(msg: impl Into<String>) -> Self {
        Self::InvalidDirectory(msg.into())
    }

    /// Create a new `Corrupt` error
    pub fn corrupt(file: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::not_found("get_api_sample.json");
        assert_eq!(err.to_string(), "Mock data not found: get_api_sample.json");

        let err = StoreError::Ambiguous {
            key: "get_api_sample.json".into(),
            matches: vec!["get_api_sample.json".into(), "get_api_sample.template".into()],
        };
        assert_eq!(
            err.to_string(),
            "More than one result found: get_api_sample.json,get_api_sample.template"
        );

        let err = StoreError::corrupt("x.json", "expected value at line 1 column 1");
        assert!(err.to_string().contains("x.json"));
    }
}
