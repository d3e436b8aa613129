//! Error types for protocol operations
//!
//! Provides error types for test case validation and payload decoding.

use serde::Serialize;
use std::fmt;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (camelCase)
    pub field: String,

    /// Human readable reason
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// One or more fields failed validation
    Validation(Vec<FieldError>),

    /// `expectedResult` was flagged binary but is not valid base64
    InvalidBase64(String),

    /// JSON serialization/deserialization error
    SerializationError(String),
}

impl ProtocolError {
    /// Field-level errors carried by this error, if any.
    ///
    /// Non-validation errors are reported against `expectedResult`, which is
    /// the only field whose content (rather than presence) is decoded.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::InvalidBase64(msg) => vec![FieldError::new("expectedResult", msg.clone())],
            Self::SerializationError(msg) => vec![FieldError::new("expectedResult", msg.clone())],
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation failed: {}", joined)
            }
            Self::InvalidBase64(msg) => write!(f, "Invalid base64 payload: {}", msg),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for ProtocolError {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidBase64(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_fields() {
        let err = ProtocolError::Validation(vec![
            FieldError::new("httpMethod", "must not be empty"),
            FieldError::new("requestPath", "must not be empty"),
        ]);
        let text = err.to_string();
        assert!(text.contains("httpMethod: must not be empty"));
        assert!(text.contains("requestPath: must not be empty"));
    }

    #[test]
    fn test_base64_error_reports_expected_result_field() {
        let err = ProtocolError::InvalidBase64("bad byte".to_string());
        let fields = err.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "expectedResult");
    }
}
