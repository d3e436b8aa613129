//! Test case declarations and request models
//!
//! Wire format is camelCase JSON. PascalCase aliases are accepted on input so
//! self-describing records written by older servers keep loading.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::key::{FixtureKey, build_graphql_key, build_key};

/// A test author's declaration of a fixture
///
/// `http_method`, `request_path` and `expected_result` are required; they are
/// modelled as defaultable so that [`crate::validation::validate_test_case`]
/// can report every missing field at once instead of failing on the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// HTTP method the fixture answers (case-insensitive)
    #[serde(default, alias = "HttpMethod")]
    pub http_method: String,

    /// Request path, with or without a leading `/`
    #[serde(default, alias = "RequestPath")]
    pub request_path: String,

    /// Opaque payload: JSON value, template source, or base64 bytes
    #[serde(
        default,
        alias = "ExpectedResult",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_result: Option<Value>,

    /// Raw query string, leading `?` optional
    #[serde(default, alias = "QueryString", skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,

    /// Render `expected_result` as a template body
    #[serde(default, alias = "IsRazorFile")]
    pub is_razor_file: bool,

    /// Persist `expected_result` verbatim under `static_content_extension`
    #[serde(default, alias = "IsStaticContent")]
    pub is_static_content: bool,

    /// Extension used when `is_static_content` is set
    #[serde(
        default,
        alias = "StaticContentExtension",
        skip_serializing_if = "Option::is_none"
    )]
    pub static_content_extension: Option<String>,

    /// `expected_result` is base64-encoded binary content
    #[serde(default, alias = "IsBinary")]
    pub is_binary: bool,

    /// Persist the whole test case as a self-describing record
    #[serde(default, alias = "SaveAsTestCase")]
    pub save_as_test_case: bool,

    /// Header name -> required value (`None` = presence only)
    #[serde(
        default,
        alias = "ExpectedHeaders",
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub expected_headers: BTreeMap<String, Option<String>>,

    /// Status code to answer with instead of 200
    #[serde(
        default,
        alias = "ExpectedStatusCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_status_code: Option<u16>,
}

impl TestCase {
    /// Create a plain JSON test case
    pub fn new(
        http_method: impl Into<String>,
        request_path: impl Into<String>,
        expected_result: Value,
    ) -> Self {
        Self {
            http_method: http_method.into(),
            request_path: request_path.into(),
            expected_result: Some(expected_result),
            ..Default::default()
        }
    }

    /// Set the query string
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    /// Require a header, optionally with a specific value
    pub fn with_expected_header(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.expected_headers
            .insert(name.into(), value.map(str::to_string));
        self
    }

    /// Answer with a specific status code
    pub fn with_status_code(mut self, status: u16) -> Self {
        self.expected_status_code = Some(status);
        self
    }

    /// Mark `expected_result` as template source
    pub fn as_template(mut self) -> Self {
        self.is_razor_file = true;
        self
    }

    /// Persist verbatim under `extension`
    pub fn as_static(mut self, extension: impl Into<String>) -> Self {
        self.is_static_content = true;
        self.static_content_extension = Some(extension.into());
        self
    }

    /// Mark `expected_result` as base64 binary
    pub fn as_binary(mut self) -> Self {
        self.is_binary = true;
        self
    }

    /// Persist as a self-describing record
    pub fn as_self_describing(mut self) -> Self {
        self.save_as_test_case = true;
        self
    }

    /// Canonical key for this test case
    pub fn key(&self) -> FixtureKey {
        build_key(
            &self.http_method,
            &self.request_path,
            self.query_string.as_deref(),
        )
    }
}

/// A GraphQL fixture declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlTestCase {
    /// Raw GraphQL document text
    #[serde(default, alias = "Query")]
    pub query: String,

    /// Operation name
    #[serde(default, alias = "OperationName")]
    pub operation_name: String,

    /// Response body returned for the operation
    #[serde(
        default,
        alias = "ExpectedResult",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_result: Option<Value>,
}

impl GraphQlTestCase {
    /// Create a new GraphQL test case
    pub fn new(
        operation_name: impl Into<String>,
        query: impl Into<String>,
        expected_result: Value,
    ) -> Self {
        Self {
            query: query.into(),
            operation_name: operation_name.into(),
            expected_result: Some(expected_result),
        }
    }

    /// Canonical key for this operation
    pub fn key(&self) -> FixtureKey {
        build_graphql_key(&self.operation_name, &self.query)
    }

    /// The operation this test case addresses
    pub fn operation(&self) -> GraphQlOperation {
        GraphQlOperation {
            operation_name: self.operation_name.clone(),
            query: self.query.clone(),
        }
    }
}

/// Identifies a GraphQL fixture without carrying a payload
///
/// Used by delete and verification calls. A full [`GraphQlTestCase`] body
/// also deserializes into this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlOperation {
    /// Operation name
    #[serde(default, alias = "OperationName")]
    pub operation_name: String,

    /// Raw GraphQL document text
    #[serde(default, alias = "Query")]
    pub query: String,
}

impl GraphQlOperation {
    /// Canonical key for this operation
    pub fn key(&self) -> FixtureKey {
        build_graphql_key(&self.operation_name, &self.query)
    }
}

/// Body of a request sent to the GraphQL endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    /// GraphQL document
    #[serde(default)]
    pub query: Option<String>,

    /// Variables (ignored for keying)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Operation name
    #[serde(default)]
    pub operation_name: Option<String>,
}

/// Request context handed to the template renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateModel {
    /// Stem of the fixture being rendered
    pub template_name: Option<String>,

    /// Method of the inbound request
    pub http_method: Option<String>,

    /// Path of the inbound request
    pub request_path: Option<String>,

    /// Query string of the inbound request
    pub query_string: Option<String>,

    /// Body of the inbound request, UTF-8 (lossy)
    pub request_body: Option<String>,
}

impl TemplateModel {
    /// Model for a request without a body
    pub fn for_request(method: &str, path: &str, query: Option<&str>) -> Self {
        Self {
            template_name: None,
            http_method: Some(method.to_string()),
            request_path: Some(path.to_string()),
            query_string: query.map(str::to_string),
            request_body: None,
        }
    }

    /// Attach the request body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
