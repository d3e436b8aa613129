//! Typed fixture payloads
//!
//! The opaque `expectedResult` of a test case is resolved once, at write time,
//! into one of three shapes according to the test case flags.

use base64::Engine;
use serde_json::Value;

use crate::error::{FieldError, ProtocolError, Result};
use crate::types::TestCase;

/// Payload of a fixture, chosen from the declared flags
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured JSON, stored as its JSON encoding
    Json(Value),

    /// Text stored verbatim (template source or static text)
    Text(String),

    /// Raw bytes (decoded from base64)
    Binary(Vec<u8>),
}

impl Payload {
    /// Bytes written to the backing store
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Json(value) => Ok(serde_json::to_vec(value)?),
            Self::Text(text) => Ok(text.clone().into_bytes()),
            Self::Binary(bytes) => Ok(bytes.clone()),
        }
    }
}

impl TestCase {
    /// Resolve `expected_result` into a typed payload
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Validation` when `expected_result` is missing,
    /// and `ProtocolError::InvalidBase64` when a binary payload is not a valid
    /// base64 string.
    pub fn payload(&self) -> Result<Payload> {
        let value = self.expected_result.as_ref().ok_or_else(|| {
            ProtocolError::Validation(vec![FieldError::new(
                "expectedResult",
                "must not be null",
            )])
        })?;

        if self.is_razor_file {
            return Ok(Payload::Text(text_of(value)?));
        }

        if self.is_binary {
            return Ok(Payload::Binary(self.decode_binary()?));
        }

        if self.is_static_content {
            return Ok(Payload::Text(text_of(value)?));
        }

        Ok(Payload::Json(value.clone()))
    }

    /// Decode `expected_result` as standard base64
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidBase64` if the payload is not a string
    /// or does not decode.
    pub fn decode_binary(&self) -> Result<Vec<u8>> {
        let Some(Value::String(encoded)) = &self.expected_result else {
            return Err(ProtocolError::InvalidBase64(
                "binary payload must be a base64 string".to_string(),
            ));
        };
        Ok(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?)
    }

    /// Template source carried by this test case
    ///
    /// A string payload is used as-is; any other value is rendered from its
    /// compact JSON text.
    pub fn template_source(&self) -> Result<String> {
        match &self.expected_result {
            Some(value) => text_of(value),
            None => Ok(String::new()),
        }
    }
}

fn text_of(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}
