//! Request resolution: expectation first, then persisted fixture
//!
//! ```text
//! request ─▶ key ─▶ expectation? ──yes──▶ serve (counted)
//!                        │
//!                        no
//!                        ▼
//!                 fixture store ─▶ header check ─▶ serve (declared status)
//! ```

use axum::Json;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, StatusCode};
use mockapi_protocol::{
    GraphQlRequest, TemplateModel, TestCase, build_graphql_key, build_key,
};
use mockapi_store::{ExpectationRegistry, FixtureContent, FixtureStore, ResolvedFixture};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};

/// An inbound request, reduced to what resolution needs
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl RequestDescriptor {
    /// Describe a request without query, headers or body
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the query string
    #[must_use]
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.map(str::to_string);
        self
    }

    /// Set the headers
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Request context handed to templates
    pub fn template_model(&self) -> TemplateModel {
        let model = TemplateModel::for_request(
            &self.method,
            &normalize_path(&self.path),
            self.query.as_deref(),
        );
        if self.body.is_empty() {
            model
        } else {
            model.with_body(String::from_utf8_lossy(&self.body))
        }
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// A registered expectation (its read count was incremented)
    Expectation,
    /// A persisted fixture
    Fixture,
}

/// A resolved response
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Body to serve
    pub content: FixtureContent,
    /// Status to serve it with
    pub status: StatusCode,
    /// Origin of the body
    pub source: ResolutionSource,
}

impl IntoResponse for Resolution {
    fn into_response(self) -> Response {
        content_response(self.status, self.content)
    }
}

/// Render fixture content as a response
pub fn content_response(status: StatusCode, content: FixtureContent) -> Response {
    let content_type = content.content_type();
    match content {
        FixtureContent::Json(value) => (status, Json(value)).into_response(),
        FixtureContent::Text { body, .. } => {
            (status, [(CONTENT_TYPE, content_type)], body).into_response()
        }
        FixtureContent::Binary { bytes, .. } => {
            (status, [(CONTENT_TYPE, content_type)], bytes).into_response()
        }
    }
}

/// Resolves requests against expectations and the fixture store
#[derive(Debug, Clone)]
pub struct RequestResolver {
    store: FixtureStore,
    expectations: Arc<ExpectationRegistry>,
}

impl RequestResolver {
    /// Create a resolver over a store and an expectation registry
    pub fn new(store: FixtureStore, expectations: Arc<ExpectationRegistry>) -> Self {
        Self {
            store,
            expectations,
        }
    }

    /// Fixture store
    pub fn store(&self) -> &FixtureStore {
        &self.store
    }

    /// Expectation registry
    pub fn expectations(&self) -> &ExpectationRegistry {
        &self.expectations
    }

    /// Resolve an inbound request
    ///
    /// # Errors
    ///
    /// - `ApiError::NotFound` when neither an expectation nor a fixture matches
    /// - `ApiError::HeaderMismatch` when the fixture requires absent headers
    /// - `ApiError::Internal` when the fixture is ambiguous or unreadable
    pub async fn resolve(&self, request: &RequestDescriptor) -> Result<Resolution> {
        let path = normalize_path(&request.path);
        let query = request.query.as_deref();
        let key = build_key(&request.method, &path, query);

        if let Some(value) = self.expectations.try_read(&key).await {
            return Ok(Resolution {
                content: FixtureContent::Json(value),
                status: StatusCode::OK,
                source: ResolutionSource::Expectation,
            });
        }

        let fixture = self
            .store
            .read(&request.method, &path, query, &request.template_model())
            .await?;

        if let Some(test_case) = &fixture.test_case {
            check_headers(test_case, &request.headers)?;
        }

        let status = declared_status(&fixture);
        Ok(Resolution {
            content: fixture.content,
            status,
            source: ResolutionSource::Fixture,
        })
    }

    /// Read a persisted fixture without touching expectations or checking headers
    pub async fn probe(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
    ) -> Result<ResolvedFixture> {
        let path = normalize_path(path);
        let model = TemplateModel::for_request(method, &path, query);
        Ok(self.store.read(method, &path, query, &model).await?)
    }

    /// Resolve a request sent to the GraphQL endpoint
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` if the query or operation name is missing.
    pub async fn resolve_graphql(&self, request: &GraphQlRequest) -> Result<Resolution> {
        let query = request
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Invalid GraphQL request: query is required"))?;
        let operation_name = request
            .operation_name
            .as_deref()
            .filter(|op| !op.trim().is_empty())
            .ok_or_else(|| {
                ApiError::bad_request("Invalid GraphQL request: operationName is required")
            })?;

        let key = build_graphql_key(operation_name, query);
        if let Some(value) = self.expectations.try_read(&key).await {
            return Ok(Resolution {
                content: FixtureContent::Json(value),
                status: StatusCode::OK,
                source: ResolutionSource::Expectation,
            });
        }

        let value = self.store.read_graphql(operation_name, query).await?;
        debug!(key = %key, "Resolved GraphQL fixture");
        Ok(Resolution {
            content: FixtureContent::Json(value),
            status: StatusCode::OK,
            source: ResolutionSource::Fixture,
        })
    }
}

/// Percent-decode a raw request path, leaving encoded slashes (`%2F`) intact
///
/// Invalid UTF-8 after decoding is replaced rather than rejected.
pub fn decode_path(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(index) = find_encoded_slash(rest) {
        decoded.push_str(&percent_decode_str(&rest[..index]).decode_utf8_lossy());
        decoded.push_str(&rest[index..index + 3]);
        rest = &rest[index + 3..];
    }
    decoded.push_str(&percent_decode_str(rest).decode_utf8_lossy());
    decoded
}

fn find_encoded_slash(path: &str) -> Option<usize> {
    path.as_bytes()
        .windows(3)
        .position(|w| w[0] == b'%' && w[1] == b'2' && w[2].eq_ignore_ascii_case(&b'f'))
}

/// Collapse repeated `/` separators
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(ch);
    }
    normalized
}

fn declared_status(fixture: &ResolvedFixture) -> StatusCode {
    fixture
        .status_code()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK)
}

/// Check the headers a fixture declares against the request
///
/// Names match case-insensitively; a declared value must equal one of the
/// header's values exactly.
pub fn check_headers(test_case: &TestCase, headers: &HeaderMap) -> Result<()> {
    for (name, expected) in &test_case.expected_headers {
        let present = HeaderName::try_from(name.as_str())
            .ok()
            .filter(|header| headers.contains_key(header));

        let Some(header) = present else {
            let names: Vec<&str> = headers.keys().map(HeaderName::as_str).collect();
            warn!(header = %name, "Expected header missing");
            return Err(ApiError::HeaderMismatch(format!(
                "Expected header {name} not found in request [{}]",
                names.join(",")
            )));
        };

        if let Some(expected) = expected {
            let matched = headers
                .get_all(&header)
                .iter()
                .any(|value| value.to_str().is_ok_and(|v| v == expected));
            if !matched {
                warn!(header = %name, expected = %expected, "Expected header value missing");
                return Err(ApiError::HeaderMismatch(format!(
                    "Expected header {name} with value {expected} not found in request"
                )));
            }
        }
    }
    Ok(())
}
