//! Error types for the mockapi server
//!
//! Every per-request failure ends up as an [`ApiError`], which renders itself
//! as an HTTP response. Bodies are JSON strings, except validation failures
//! which list every failing field.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use mockapi_protocol::{FieldError, ProtocolError};
use mockapi_store::{StoreError, Verification};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error, info};

/// Result type alias for request handlers
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// No fixture or expectation matches the request (404).
    #[error("{0}")]
    NotFound(String),

    /// Request is malformed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Declaration failed validation (400).
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Request is missing a header the fixture requires (400).
    #[error("{0}")]
    HeaderMismatch(String),

    /// Verified read count differs from the expected one (400).
    #[error("{0}")]
    CountMismatch(Verification),

    /// Request was rejected by an extractor.
    #[error("{message}")]
    Rejected {
        /// Status chosen by the extractor
        status: StatusCode,
        /// Extractor message
        message: String,
    },

    /// Fixture exists but cannot be served (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Create a new `BadRequest` error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a new `NotFound` error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::HeaderMismatch(_)
            | Self::CountMismatch(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else if status == StatusCode::NOT_FOUND {
            info!(error = %self, "Request not matched");
        } else {
            debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        match self {
            Self::Validation(errors) => (status, Json(json!({ "errors": errors }))).into_response(),
            other => (status, Json(other.to_string())).into_response(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::InvalidFileName(_) => Self::BadRequest(err.to_string()),
            StoreError::Protocol(protocol) => protocol.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        Self::Validation(err.field_errors())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Errors raised while loading or validating server configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable holds an unusable value
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    InvalidValue {
        /// Variable name
        variable: &'static str,
        /// Offending value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Data directory does not exist
    #[error("Data directory does not exist: {}", .0.display())]
    MissingDataDir(PathBuf),

    /// Data directory path is not a directory
    #[error("Data directory is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}
