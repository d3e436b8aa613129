//! Shared protocol types for the mockapi fixture server
//!
//! This crate holds everything about a fixture that can be decided without
//! touching storage: how a test author declares it, how its payload is typed,
//! and which canonical key it lives under.
//!
//! # Type Organization
//!
//! - **Declarations**: [`types`] - `TestCase`, `GraphQlTestCase`, GraphQL request bodies
//! - **Payloads**: [`payload`] - JSON / text / binary tagged union
//! - **Keys**: [`key`] - canonical fixture key derivation
//! - **Validation**: [`validation`] - field-level checks
//! - **Error types**: [`error`] - protocol and validation errors
//!
//! # Design Principles
//!
//! - **Zero I/O**: All types are pure data structures and pure functions
//! - **Serialization**: serde-based, camelCase on the wire

#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! # Usage
//!
//! ```
//! use mockapi_protocol::{TestCase, build_key};
//! use serde_json::json;
//!
//! let tc = TestCase::new("GET", "/api/Sample", json!({"Id": "x"}));
//! assert_eq!(tc.key().to_string(), "get_api_sample.json");
//! assert_eq!(build_key("GET", "api/Sample", None), tc.key());
//! ```

pub mod error;
pub mod key;
pub mod payload;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate level
pub use error::{FieldError, ProtocolError, Result};
pub use key::{FixtureKey, GRAPHQL_EXTENSION, JSON_EXTENSION, build_graphql_key, build_key};
pub use payload::Payload;
pub use types::{GraphQlOperation, GraphQlRequest, GraphQlTestCase, TemplateModel, TestCase};
pub use validation::{validate_graphql_operation, validate_graphql_test_case, validate_test_case};
