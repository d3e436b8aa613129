//! Canonical fixture keys
//!
//! Turns a request descriptor (method, path, query string) or a GraphQL
//! operation into the deterministic name a fixture is stored under:
//!
//! ```text
//! {method}_{path_with_underscores}[_{MD5(query)}].json
//! {operation}_{MD5(query_without_whitespace)}.graphql
//! ```
//!
//! Query strings are hashed byte-for-byte, so `a=1&b=2` and `b=2&a=1` address
//! different fixtures. Headers never participate in a key.

use md5::{Digest, Md5};
use std::fmt;

/// Extension used by HTTP fixture keys
pub const JSON_EXTENSION: &str = "json";

/// Extension used by GraphQL fixture keys
pub const GRAPHQL_EXTENSION: &str = "graphql";

/// A canonical, case-normalized fixture key
///
/// `Display` yields the default file name (`{stem}.{extension}`), which is also
/// the key the expectation registry is indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureKey {
    stem: String,
    extension: &'static str,
}

impl FixtureKey {
    /// File name without extension
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Default extension for this key
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Default file name for this key
    pub fn file_name(&self) -> String {
        self.with_extension(self.extension)
    }

    /// File name for this key stored under a different content kind
    pub fn with_extension(&self, extension: &str) -> String {
        format!("{}.{}", self.stem, extension)
    }

    /// Whether `file_name` stores this key under any extension
    ///
    /// Only the last dot separates the extension, so `get_api_v1` does not
    /// match `get_api_v1.0_items.json`.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.stem.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|extension| !extension.is_empty() && !extension.contains('.'))
    }
}

impl fmt::Display for FixtureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem, self.extension)
    }
}

/// Build the key for an HTTP request
///
/// A single leading `/` is dropped from the path, method and path are
/// lower-cased and every `/` becomes `_`. A non-empty query string (leading
/// `?` ignored) contributes `_` plus its upper-hex MD5.
pub fn build_key(method: &str, path: &str, query: Option<&str>) -> FixtureKey {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut stem = format!(
        "{}_{}",
        method.to_lowercase(),
        path.to_lowercase().replace('/', "_")
    );

    if let Some(query) = normalize_query(query) {
        stem.push('_');
        stem.push_str(&md5_upper_hex(query.as_bytes()));
    }

    FixtureKey {
        stem,
        extension: JSON_EXTENSION,
    }
}

/// Build the key for a GraphQL operation
///
/// Every whitespace character is removed from the query before hashing, so
/// formatting changes keep the key stable while token changes do not.
pub fn build_graphql_key(operation_name: &str, query: &str) -> FixtureKey {
    let minified = strip_whitespace(query);
    FixtureKey {
        stem: format!(
            "{}_{}",
            operation_name.to_lowercase(),
            md5_upper_hex(minified.as_bytes())
        ),
        extension: GRAPHQL_EXTENSION,
    }
}

/// Drop a leading `?`; an empty remainder means "no query string"
pub fn normalize_query(query: Option<&str>) -> Option<&str> {
    query
        .map(|q| q.strip_prefix('?').unwrap_or(q))
        .filter(|q| !q.is_empty())
}

/// Remove every whitespace character
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn md5_upper_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Md5::digest(bytes))
}
