//! Validation of test case declarations
//!
//! Every check runs and all failures are reported together, keyed by the
//! wire name of the field.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FieldError, ProtocolError, Result};
use crate::key::{GRAPHQL_EXTENSION, JSON_EXTENSION};
use crate::types::{GraphQlOperation, GraphQlTestCase, TestCase};

/// Extensions that carry a meaning of their own and cannot hold static content
const RESERVED_STATIC_EXTENSIONS: &[&str] = &["template", "testcase", GRAPHQL_EXTENSION];

/// HTTP method token (RFC 9110 `token`, restricted to letters)
static METHOD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("Failed to compile method regex"));

/// Static content extension, optional leading dot
static EXTENSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.?[A-Za-z0-9]+$").expect("Failed to compile extension regex"));

/// Validate a [`TestCase`]
///
/// Checks:
/// - `httpMethod`, `requestPath` present, `expectedResult` not null
/// - `isStaticContent` requires a usable `staticContentExtension`
/// - `isBinary` requires `expectedResult` to decode as base64
/// - static content stored under `json` must itself be JSON
/// - `expectedStatusCode` must be a final status (200..=599)
///
/// # Errors
///
/// Returns `ProtocolError::Validation` listing every failing field.
pub fn validate_test_case(test_case: &TestCase) -> Result<()> {
    let mut errors = Vec::new();

    if test_case.http_method.trim().is_empty() {
        errors.push(FieldError::new("httpMethod", "must not be empty"));
    } else if !METHOD_PATTERN.is_match(&test_case.http_method) {
        errors.push(FieldError::new(
            "httpMethod",
            format!("'{}' is not a valid HTTP method", test_case.http_method),
        ));
    }

    if test_case.request_path.trim().is_empty() {
        errors.push(FieldError::new("requestPath", "must not be empty"));
    }

    if test_case.expected_result.is_none() {
        errors.push(FieldError::new("expectedResult", "must not be null"));
    }

    if test_case.is_static_content {
        match test_case.static_content_extension.as_deref() {
            None | Some("") => errors.push(FieldError::new(
                "staticContentExtension",
                "is required when isStaticContent is set",
            )),
            Some(ext) if !EXTENSION_PATTERN.is_match(ext) => errors.push(FieldError::new(
                "staticContentExtension",
                format!("'{ext}' must be alphanumeric"),
            )),
            Some(ext) if RESERVED_STATIC_EXTENSIONS.contains(&normalize_extension(ext).as_str()) => {
                errors.push(FieldError::new(
                    "staticContentExtension",
                    format!("'{ext}' is reserved"),
                ));
            }
            Some(_) => {}
        }
    }

    if test_case.is_binary
        && test_case.expected_result.is_some()
        && let Err(err) = test_case.decode_binary()
    {
        errors.extend(err.field_errors());
    }

    if let Some(error) = static_json_error(test_case) {
        errors.push(error);
    }

    if let Some(status) = test_case.expected_status_code
        && !(200..=599).contains(&status)
    {
        errors.push(FieldError::new(
            "expectedStatusCode",
            format!("{status} is not a valid HTTP status code"),
        ));
    }

    finish(errors)
}

/// Validate a [`GraphQlTestCase`]
///
/// # Errors
///
/// Returns `ProtocolError::Validation` listing every failing field.
pub fn validate_graphql_test_case(test_case: &GraphQlTestCase) -> Result<()> {
    let mut errors = operation_errors(&test_case.operation_name, &test_case.query);
    if test_case.expected_result.is_none() {
        errors.push(FieldError::new("expectedResult", "must not be null"));
    }
    finish(errors)
}

/// Validate a [`GraphQlOperation`] selector
///
/// # Errors
///
/// Returns `ProtocolError::Validation` listing every failing field.
pub fn validate_graphql_operation(operation: &GraphQlOperation) -> Result<()> {
    finish(operation_errors(&operation.operation_name, &operation.query))
}

/// Lower-case an extension and drop a leading dot
pub fn normalize_extension(extension: &str) -> String {
    extension
        .strip_prefix('.')
        .unwrap_or(extension)
        .to_lowercase()
}

/// Whether an extension is the default JSON kind
pub fn is_json_extension(extension: &str) -> bool {
    normalize_extension(extension) == JSON_EXTENSION
}

/// Static content under a `json` extension is served through the JSON path,
/// so the stored bytes have to parse.
fn static_json_error(test_case: &TestCase) -> Option<FieldError> {
    if test_case.save_as_test_case || test_case.is_razor_file || !test_case.is_static_content {
        return None;
    }
    let extension = test_case.static_content_extension.as_deref()?;
    if !is_json_extension(extension) {
        return None;
    }

    // Undecodable payloads are reported by the binary check
    let bytes = test_case.payload().ok()?.to_bytes().ok()?;
    serde_json::from_slice::<serde_json::Value>(&bytes)
        .is_err()
        .then(|| FieldError::new("expectedResult", "must be valid JSON when stored as json"))
}

fn operation_errors(operation_name: &str, query: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if query.trim().is_empty() {
        errors.push(FieldError::new("query", "must not be empty"));
    }
    if operation_name.trim().is_empty() {
        errors.push(FieldError::new("operationName", "must not be empty"));
    }
    errors
}

fn finish(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(result: Result<()>) -> Vec<String> {
        match result {
            Err(ProtocolError::Validation(errors)) => {
                errors.into_iter().map(|e| e.field).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_test_case() {
        let tc = TestCase::new("GET", "api/Sample", json!({"Id": "x"}));
        assert!(validate_test_case(&tc).is_ok());
    }

    #[test]
    fn test_all_required_fields_reported() {
        let tc = TestCase::default();
        assert_eq!(
            fields(validate_test_case(&tc)),
            vec!["httpMethod", "requestPath", "expectedResult"]
        );
    }

    #[test]
    fn test_invalid_method() {
        let tc = TestCase::new("GE T", "api/x", json!(1));
        assert_eq!(fields(validate_test_case(&tc)), vec!["httpMethod"]);
    }

    #[test]
    fn test_static_requires_extension() {
        let mut tc = TestCase::new("GET", "api/x", json!("x"));
        tc.is_static_content = true;
        assert_eq!(fields(validate_test_case(&tc)), vec!["staticContentExtension"]);
    }

    #[test]
    fn test_static_extension_rules() {
        assert!(validate_test_case(&TestCase::new("GET", "x", json!("x")).as_static(".html")).is_ok());
        assert!(validate_test_case(&TestCase::new("GET", "x", json!("x")).as_static("css")).is_ok());
        assert!(validate_test_case(&TestCase::new("GET", "x", json!("x")).as_static("../etc")).is_err());
        assert!(validate_test_case(&TestCase::new("GET", "x", json!("x")).as_static("a/b")).is_err());
        assert!(validate_test_case(&TestCase::new("GET", "x", json!("x")).as_static("Template")).is_err());
        assert!(validate_test_case(&TestCase::new("GET", "x", json!("x")).as_static("testcase")).is_err());
    }

    #[test]
    fn test_binary_requires_base64() {
        let tc = TestCase::new("GET", "x", json!("%%%")).as_binary();
        assert_eq!(fields(validate_test_case(&tc)), vec!["expectedResult"]);

        let tc = TestCase::new("GET", "x", json!("aGVsbG8=")).as_binary();
        assert!(validate_test_case(&tc).is_ok());
    }

    #[test]
    fn test_status_code_range() {
        let tc = TestCase::new("GET", "x", json!(1)).with_status_code(42);
        assert_eq!(fields(validate_test_case(&tc)), vec!["expectedStatusCode"]);
        let tc = TestCase::new("GET", "x", json!(1)).with_status_code(101);
        assert_eq!(fields(validate_test_case(&tc)), vec!["expectedStatusCode"]);
        let tc = TestCase::new("GET", "x", json!(1)).with_status_code(418);
        assert!(validate_test_case(&tc).is_ok());
        let tc = TestCase::new("GET", "x", json!(1)).with_status_code(200);
        assert!(validate_test_case(&tc).is_ok());
    }

    #[test]
    fn test_static_json_must_parse() {
        let tc = TestCase::new("GET", "api/raw", json!("hello")).as_static("json");
        assert_eq!(fields(validate_test_case(&tc)), vec!["expectedResult"]);

        let tc = TestCase::new("GET", "api/raw", json!(r#"{"a":1}"#)).as_static(".JSON");
        assert!(validate_test_case(&tc).is_ok());

        // Templates render before parsing, so their source is free-form
        let tc = TestCase::new("GET", "api/raw", json!("@Model.RequestBody"))
            .as_static("json")
            .as_template();
        assert!(validate_test_case(&tc).is_ok());
    }

    #[test]
    fn test_graphql_validation() {
        let tc = GraphQlTestCase::default();
        assert_eq!(
            fields(validate_graphql_test_case(&tc)),
            vec!["query", "operationName", "expectedResult"]
        );
        let tc = GraphQlTestCase::new("Op", "{ a }", json!({}));
        assert!(validate_graphql_test_case(&tc).is_ok());
        assert!(validate_graphql_operation(&tc.operation()).is_ok());
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".HTML"), "html");
        assert_eq!(normalize_extension("css"), "css");
        assert!(is_json_extension(".Json"));
    }
}
