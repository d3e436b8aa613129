//! Fixture kinds and resolved content
//!
//! The file extension decides how stored bytes are interpreted:
//!
//! | Extension   | Kind                | Served as                       |
//! |-------------|---------------------|---------------------------------|
//! | `.json`     | JSON                | parsed JSON                     |
//! | `.graphql`  | JSON                | parsed JSON                     |
//! | `.template` | template            | rendered, JSON if it parses     |
//! | `.testcase` | self-describing     | whatever the record declares    |
//! | other       | static text/binary  | verbatim with a content type    |

use mockapi_protocol::validation::normalize_extension;
use mockapi_protocol::{GRAPHQL_EXTENSION, JSON_EXTENSION, TestCase};
use serde_json::Value;

/// Extension of template fixtures
pub const TEMPLATE_EXTENSION: &str = "template";

/// Extension of self-describing test case records
pub const TEST_CASE_EXTENSION: &str = "testcase";

/// Extension used for binary payloads declared without a static extension
pub const BINARY_EXTENSION: &str = "bin";

/// Fallback content type
pub const OCTET_STREAM: &str = "application/octet-stream";

/// How a stored fixture is interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureKind {
    /// JSON document
    Json,
    /// Template source rendered per request
    Template,
    /// Whole test case record
    SelfDescribing,
    /// Text served verbatim, with its extension
    StaticText(String),
    /// Bytes served verbatim, with their extension
    StaticBinary(String),
}

impl FixtureKind {
    /// Kind a declaration is persisted as
    ///
    /// Precedence: self-describing, then template, then static/binary, then JSON.
    #[must_use]
    pub fn for_test_case(test_case: &TestCase) -> Self {
        if test_case.save_as_test_case {
            return Self::SelfDescribing;
        }
        if test_case.is_razor_file {
            return Self::Template;
        }

        let extension = test_case
            .static_content_extension
            .as_deref()
            .map(normalize_extension)
            .filter(|ext| !ext.is_empty());

        match (test_case.is_static_content, test_case.is_binary) {
            (true, true) => Self::StaticBinary(extension.unwrap_or_else(|| BINARY_EXTENSION.into())),
            (true, false) => Self::StaticText(extension.unwrap_or_else(|| JSON_EXTENSION.into())),
            (false, true) => Self::StaticBinary(BINARY_EXTENSION.into()),
            (false, false) => Self::Json,
        }
    }

    /// Kind of a stored file, from its name and contents
    #[must_use]
    pub fn classify(file_name: &str, bytes: &[u8]) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            JSON_EXTENSION | GRAPHQL_EXTENSION => Self::Json,
            TEMPLATE_EXTENSION => Self::Template,
            TEST_CASE_EXTENSION => Self::SelfDescribing,
            _ if std::str::from_utf8(bytes).is_ok() && !is_binary_extension(&extension) => {
                Self::StaticText(extension)
            }
            _ => Self::StaticBinary(extension),
        }
    }

    /// Extension the kind is stored under
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Self::Json => JSON_EXTENSION,
            Self::Template => TEMPLATE_EXTENSION,
            Self::SelfDescribing => TEST_CASE_EXTENSION,
            Self::StaticText(ext) | Self::StaticBinary(ext) => ext,
        }
    }
}

/// Content type for a static extension
#[must_use]
pub fn content_type_for(extension: &str) -> &'static str {
    match normalize_extension(extension).as_str() {
        "json" | "graphql" => "application/json",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => OCTET_STREAM,
    }
}

fn is_binary_extension(extension: &str) -> bool {
    matches!(
        extension,
        "bin" | "png" | "jpg" | "jpeg" | "gif" | "pdf" | "ico" | "woff2"
    )
}

/// A fixture body ready to be served
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureContent {
    /// JSON document
    Json(Value),

    /// Text body
    Text {
        /// Body text
        body: String,
        /// Content type header value
        content_type: &'static str,
    },

    /// Raw bytes
    Binary {
        /// Body bytes
        bytes: Vec<u8>,
        /// Content type header value
        content_type: &'static str,
    },
}

impl FixtureContent {
    /// Content from rendered template output
    ///
    /// Output that parses as JSON is served as JSON, anything else as plain text.
    #[must_use]
    pub fn from_rendered(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text {
                body: text,
                content_type: "text/plain; charset=utf-8",
            },
        }
    }

    /// Static content stored under `extension`
    #[must_use]
    pub fn from_static(extension: &str, bytes: Vec<u8>) -> Self {
        let content_type = content_type_for(extension);
        match String::from_utf8(bytes) {
            Ok(body) if !is_binary_extension(&normalize_extension(extension)) => {
                Self::Text { body, content_type }
            }
            Ok(body) => Self::Binary {
                bytes: body.into_bytes(),
                content_type,
            },
            Err(err) => Self::Binary {
                bytes: err.into_bytes(),
                content_type,
            },
        }
    }

    /// Content type header value
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => "application/json",
            Self::Text { content_type, .. } | Self::Binary { content_type, .. } => content_type,
        }
    }
}

/// A fixture located and decoded by the store
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFixture {
    /// File the fixture was read from
    pub file_name: String,

    /// Kind of the stored file
    pub kind: FixtureKind,

    /// Body to serve
    pub content: FixtureContent,

    /// Declaration, when the fixture is a self-describing record
    pub test_case: Option<TestCase>,
}

impl ResolvedFixture {
    /// Status code the fixture asks to be served with
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.test_case
            .as_ref()
            .and_then(|tc| tc.expected_status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_precedence() {
        let base = TestCase::new("GET", "x", json!("x"));
        assert_eq!(FixtureKind::for_test_case(&base), FixtureKind::Json);
        assert_eq!(
            FixtureKind::for_test_case(&base.clone().as_static(".HTML")),
            FixtureKind::StaticText("html".into())
        );
        assert_eq!(
            FixtureKind::for_test_case(&base.clone().as_static("png").as_binary()),
            FixtureKind::StaticBinary("png".into())
        );
        assert_eq!(
            FixtureKind::for_test_case(&base.clone().as_binary()),
            FixtureKind::StaticBinary("bin".into())
        );
        assert_eq!(
            FixtureKind::for_test_case(&base.clone().as_static("html").as_template()),
            FixtureKind::Template
        );
        assert_eq!(
            FixtureKind::for_test_case(&base.as_template().as_self_describing()),
            FixtureKind::SelfDescribing
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(FixtureKind::classify("a.json", b"{}"), FixtureKind::Json);
        assert_eq!(FixtureKind::classify("a.graphql", b"{}"), FixtureKind::Json);
        assert_eq!(FixtureKind::classify("a.Template", b"x"), FixtureKind::Template);
        assert_eq!(
            FixtureKind::classify("a.testcase", b"{}"),
            FixtureKind::SelfDescribing
        );
        assert_eq!(
            FixtureKind::classify("a.html", b"<p/>"),
            FixtureKind::StaticText("html".into())
        );
        assert_eq!(
            FixtureKind::classify("a.dat", &[0xff, 0xfe]),
            FixtureKind::StaticBinary("dat".into())
        );
        assert_eq!(
            FixtureKind::classify("a.png", b"PNG"),
            FixtureKind::StaticBinary("png".into())
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for(".CSS"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("weird"), OCTET_STREAM);
    }

    #[test]
    fn test_from_rendered() {
        assert_eq!(
            FixtureContent::from_rendered(r#"{"a":1}"#.into()),
            FixtureContent::Json(json!({"a": 1}))
        );
        let text = FixtureContent::from_rendered("Hello GET".into());
        assert_eq!(text.content_type(), "text/plain; charset=utf-8");
        assert!(matches!(text, FixtureContent::Text { .. }));
    }

    #[test]
    fn test_from_static() {
        assert_eq!(
            FixtureContent::from_static("html", b"<h1>hi</h1>".to_vec()),
            FixtureContent::Text {
                body: "<h1>hi</h1>".into(),
                content_type: "text/html; charset=utf-8",
            }
        );
        assert_eq!(
            FixtureContent::from_static("png", vec![1, 2]),
            FixtureContent::Binary {
                bytes: vec![1, 2],
                content_type: "image/png",
            }
        );
        assert_eq!(
            FixtureContent::from_static("txt", vec![0xff]).content_type(),
            "text/plain; charset=utf-8"
        );
    }
}
