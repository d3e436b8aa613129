//! Fixture and expectation management endpoints

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use http::StatusCode;
use mockapi_protocol::{TestCase, build_key, validate_test_case};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, Result};
use crate::resolver::{content_response, normalize_path};

/// Query parameters addressing a fixture
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureQuery {
    /// Request path of the fixture
    pub path: Option<String>,
    /// Query string of the fixture
    pub query_string: Option<String>,
}

impl FixtureQuery {
    fn path(&self) -> Result<String> {
        self.path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(normalize_path)
            .ok_or_else(|| ApiError::bad_request("Query parameter 'path' is required"))
    }
}

/// Body returned after writing or deleting a fixture
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileNameResponse {
    /// File the operation touched
    pub file_name: String,
}

/// Body returned after registering an expectation
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationResponse {
    /// Key the expectation is registered under
    pub key: String,
    /// Whether an earlier expectation was replaced
    pub replaced: bool,
}

/// `GET /fixtures`: persisted names and registered expectation keys
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let mut names: BTreeSet<String> = state.resolver.store().list().await?.into_iter().collect();
    names.extend(state.resolver.expectations().keys().await);
    Ok(Json(names.into_iter().collect()))
}

/// `POST|PUT /fixtures`: persist a test case
pub async fn write(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TestCase>, JsonRejection>,
) -> Result<Json<FileNameResponse>> {
    let Json(mut test_case) = payload?;
    test_case.request_path = normalize_path(&test_case.request_path);
    let file_name = state.resolver.store().write(&test_case).await?;
    Ok(Json(FileNameResponse { file_name }))
}

/// `GET /fixtures/{method}`: read a persisted fixture without side effects
pub async fn probe(
    State(state): State<AppState>,
    method: std::result::Result<Path<String>, PathRejection>,
    Query(query): Query<FixtureQuery>,
) -> Result<Response> {
    let Path(method) = method?;
    let fixture = state
        .resolver
        .probe(&method, &query.path()?, query.query_string.as_deref())
        .await?;
    Ok(content_response(StatusCode::OK, fixture.content))
}

/// `DELETE /fixtures/{method}`: delete a persisted fixture
pub async fn delete(
    State(state): State<AppState>,
    method: std::result::Result<Path<String>, PathRejection>,
    Query(query): Query<FixtureQuery>,
) -> Result<Json<FileNameResponse>> {
    let Path(method) = method?;
    let file_name = state
        .resolver
        .store()
        .delete(&method, &query.path()?, query.query_string.as_deref())
        .await?;
    Ok(Json(FileNameResponse { file_name }))
}

/// `DELETE /fixtures/files/{fileName}`: delete a fixture by file name
pub async fn delete_file(
    State(state): State<AppState>,
    file_name: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<FileNameResponse>> {
    let Path(file_name) = file_name?;
    let file_name = state.resolver.store().delete_file(&file_name).await?;
    Ok(Json(FileNameResponse { file_name }))
}

/// `POST|PUT /fixtures/expect-setup`: register an expectation
pub async fn expect_setup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TestCase>, JsonRejection>,
) -> Result<Json<ExpectationResponse>> {
    let Json(mut test_case) = payload?;
    validate_test_case(&test_case)?;

    test_case.request_path = normalize_path(&test_case.request_path);
    let key = test_case.key();
    let expected_result = test_case.expected_result.take().unwrap_or_default();
    let replaced = state
        .resolver
        .expectations()
        .set_or_replace(&key, expected_result)
        .await;

    Ok(Json(ExpectationResponse {
        key: key.to_string(),
        replaced,
    }))
}

/// `GET /fixtures/expect/{count}/{method}`: consume an expectation and compare its count
pub async fn verify(
    State(state): State<AppState>,
    params: std::result::Result<Path<(u32, String)>, PathRejection>,
    Query(query): Query<FixtureQuery>,
) -> Result<Json<u32>> {
    let Path((expected, method)) = params?;
    let key = build_key(&method, &query.path()?, query.query_string.as_deref());

    let verification = state.resolver.expectations().verify(&key, expected).await;
    if verification.is_satisfied() {
        Ok(Json(verification.actual))
    } else {
        Err(ApiError::CountMismatch(verification))
    }
}

/// Body returned after clearing expectations
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearedResponse {
    /// Number of expectations removed
    pub cleared: usize,
}

/// `DELETE /fixtures/expectations`: drop every expectation
pub async fn clear_expectations(State(state): State<AppState>) -> Json<ClearedResponse> {
    let cleared = state.resolver.expectations().clear().await;
    info!(cleared, "Cleared expectations");
    Json(ClearedResponse { cleared })
}
