//! Fixture persistence keyed by request descriptor

use mockapi_protocol::{
    FixtureKey, GraphQlOperation, GraphQlTestCase, Payload, ProtocolError, TemplateModel,
    TestCase, build_graphql_key, build_key, validate_graphql_operation,
    validate_graphql_test_case, validate_test_case,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{FixtureBackend, FsBackend, MemoryBackend, validate_file_name};
use crate::content::{FixtureContent, FixtureKind, ResolvedFixture};
use crate::error::{Result, StoreError};
use crate::template::{ModelTemplateRenderer, TemplateGateway};

/// Persists fixtures and resolves requests to them
///
/// At most one stored file may match a key; a second file sharing the stem is
/// reported as [`StoreError::Ambiguous`] on read.
#[derive(Clone)]
pub struct FixtureStore {
    backend: Arc<dyn FixtureBackend>,
    templates: Arc<dyn TemplateGateway>,
}

impl std::fmt::Debug for FixtureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureStore")
            .field("backend", &self.backend.describe())
            .finish_non_exhaustive()
    }
}

impl FixtureStore {
    /// Create a store over `backend` with the default template renderer
    pub fn new(backend: Arc<dyn FixtureBackend>) -> Self {
        Self {
            backend,
            templates: Arc::new(ModelTemplateRenderer),
        }
    }

    /// Open a store over an existing data directory
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDirectory` if the directory is unusable.
    pub fn open_dir(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(Arc::new(FsBackend::open(root)?)))
    }

    /// Create a store that keeps fixtures in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Replace the template renderer
    #[must_use]
    pub fn with_templates(mut self, templates: Arc<dyn TemplateGateway>) -> Self {
        self.templates = templates;
        self
    }

    /// Location of the backing store
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Persist a declaration, returning the file name written
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Protocol` if the declaration is invalid; nothing is
    /// written in that case.
    pub async fn write(&self, test_case: &TestCase) -> Result<String> {
        validate_test_case(test_case)?;

        let kind = FixtureKind::for_test_case(test_case);
        let file_name = test_case.key().with_extension(kind.extension());
        let bytes = match kind {
            FixtureKind::SelfDescribing => {
                serde_json::to_vec(test_case).map_err(ProtocolError::from)?
            }
            _ => test_case.payload()?.to_bytes()?,
        };

        self.backend.write(&file_name, bytes).await?;
        info!(file = %file_name, kind = ?kind, "Stored fixture");
        Ok(file_name)
    }

    /// Persist a GraphQL fixture, returning the file name written
    pub async fn write_graphql(&self, test_case: &GraphQlTestCase) -> Result<String> {
        validate_graphql_test_case(test_case)?;

        let file_name = test_case.key().file_name();
        let value = test_case.expected_result.clone().unwrap_or(Value::Null);
        let bytes = Payload::Json(value).to_bytes()?;

        self.backend.write(&file_name, bytes).await?;
        info!(file = %file_name, operation = %test_case.operation_name, "Stored GraphQL fixture");
        Ok(file_name)
    }

    /// Resolve a request to its fixture
    ///
    /// Templates are rendered with `model`; its `template_name` is filled in
    /// with the fixture stem.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when no file matches,
    /// `StoreError::Ambiguous` when several do, and `StoreError::Corrupt` or
    /// `StoreError::Template` when the match cannot be decoded.
    pub async fn read(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
        model: &TemplateModel,
    ) -> Result<ResolvedFixture> {
        let key = build_key(method, path, query);
        let file_name = self.resolve_file_name(&key).await?;
        let bytes = self.backend.read(&file_name).await?;
        let kind = FixtureKind::classify(&file_name, &bytes);
        debug!(key = %key, file = %file_name, kind = ?kind, "Resolved fixture");

        let mut model = model.clone();
        model.template_name = Some(key.stem().to_string());

        let (content, test_case) = match &kind {
            FixtureKind::Json => (FixtureContent::Json(parse_json(&file_name, &bytes)?), None),
            FixtureKind::Template => {
                let source = utf8(&file_name, bytes)?;
                (self.render(&source, &model)?, None)
            }
            FixtureKind::StaticText(ext) | FixtureKind::StaticBinary(ext) => {
                (FixtureContent::from_static(ext, bytes), None)
            }
            FixtureKind::SelfDescribing => {
                let test_case: TestCase = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::corrupt(&file_name, e))?;
                (self.content_of(&test_case, &model)?, Some(test_case))
            }
        };

        Ok(ResolvedFixture {
            file_name,
            kind,
            content,
            test_case,
        })
    }

    /// Read the GraphQL fixture for an operation
    pub async fn read_graphql(&self, operation_name: &str, query: &str) -> Result<Value> {
        let file_name = build_graphql_key(operation_name, query).file_name();
        let bytes = self.backend.read(&file_name).await?;
        parse_json(&file_name, &bytes)
    }

    /// Delete the fixture a request resolves to, returning its file name
    pub async fn delete(&self, method: &str, path: &str, query: Option<&str>) -> Result<String> {
        let key = build_key(method, path, query);
        let file_name = self.resolve_file_name(&key).await?;
        self.backend.remove(&file_name).await?;
        info!(file = %file_name, "Deleted fixture");
        Ok(file_name)
    }

    /// Delete a fixture by its literal file name, returning that name
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFileName` for names containing a path
    /// separator or `..`.
    pub async fn delete_file(&self, file_name: &str) -> Result<String> {
        validate_file_name(file_name)?;
        if file_name.contains("..") {
            return Err(StoreError::invalid_file_name(file_name));
        }
        self.backend.remove(file_name).await?;
        info!(file = %file_name, "Deleted fixture file");
        Ok(file_name.to_string())
    }

    /// Delete a GraphQL fixture, returning its file name
    pub async fn delete_graphql(&self, operation: &GraphQlOperation) -> Result<String> {
        validate_graphql_operation(operation)?;
        let file_name = operation.key().file_name();
        self.backend.remove(&file_name).await?;
        info!(file = %file_name, "Deleted GraphQL fixture");
        Ok(file_name)
    }

    /// Every persisted file name, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        self.backend.list().await
    }

    async fn resolve_file_name(&self, key: &FixtureKey) -> Result<String> {
        let mut matches: Vec<String> = self
            .backend
            .list()
            .await?
            .into_iter()
            .filter(|name| key.matches_file_name(name))
            .collect();

        match matches.len() {
            0 => Err(StoreError::not_found(key.file_name())),
            1 => Ok(matches.remove(0)),
            _ => Err(StoreError::Ambiguous {
                key: key.file_name(),
                matches,
            }),
        }
    }

    fn render(&self, source: &str, model: &TemplateModel) -> Result<FixtureContent> {
        let rendered = self.templates.render(source, model)?;
        Ok(FixtureContent::from_rendered(rendered))
    }

    fn content_of(&self, test_case: &TestCase, model: &TemplateModel) -> Result<FixtureContent> {
        if test_case.is_razor_file {
            return self.render(&test_case.template_source()?, model);
        }

        let kind = FixtureKind::for_test_case(&TestCase {
            save_as_test_case: false,
            ..test_case.clone()
        });
        Ok(match test_case.payload()? {
            Payload::Json(value) => FixtureContent::Json(value),
            Payload::Text(text) => FixtureContent::from_static(kind.extension(), text.into_bytes()),
            Payload::Binary(bytes) => FixtureContent::from_static(kind.extension(), bytes),
        })
    }
}

fn parse_json(file_name: &str, bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::corrupt(file_name, e))
}

fn utf8(file_name: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| StoreError::corrupt(file_name, e))
}
