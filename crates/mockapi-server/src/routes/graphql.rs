//! GraphQL fixture management and the GraphQL endpoint

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use mockapi_protocol::{
    GraphQlOperation, GraphQlRequest, GraphQlTestCase, validate_graphql_operation,
    validate_graphql_test_case,
};

use super::fixtures::{ExpectationResponse, FileNameResponse};
use crate::AppState;
use crate::error::{ApiError, Result};
use crate::resolver::Resolution;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// `POST|PUT /fixtures/graphql`: persist a GraphQL fixture
pub async fn write(
    State(state): State<AppState>,
    payload: JsonBody<GraphQlTestCase>,
) -> Result<Json<FileNameResponse>> {
    let Json(test_case) = payload?;
    let file_name = state.resolver.store().write_graphql(&test_case).await?;
    Ok(Json(FileNameResponse { file_name }))
}

/// `DELETE /fixtures/graphql`: delete a GraphQL fixture
pub async fn delete(
    State(state): State<AppState>,
    payload: JsonBody<GraphQlOperation>,
) -> Result<Json<FileNameResponse>> {
    let Json(operation) = payload?;
    let file_name = state.resolver.store().delete_graphql(&operation).await?;
    Ok(Json(FileNameResponse { file_name }))
}

/// `POST|PUT /fixtures/graphql/expect-setup`: register a GraphQL expectation
pub async fn expect_setup(
    State(state): State<AppState>,
    payload: JsonBody<GraphQlTestCase>,
) -> Result<Json<ExpectationResponse>> {
    let Json(mut test_case) = payload?;
    validate_graphql_test_case(&test_case)?;

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

/// `POST /fixtures/graphql/expect/{count}`: consume a GraphQL expectation and compare its count
pub async fn verify(
    State(state): State<AppState>,
    count: std::result::Result<Path<u32>, PathRejection>,
    payload: JsonBody<GraphQlOperation>,
) -> Result<Json<u32>> {
    let Path(expected) = count?;
    let Json(operation) = payload?;
    validate_graphql_operation(&operation)?;

    let verification = state
        .resolver
        .expectations()
        .verify(&operation.key(), expected)
        .await;
    if verification.is_satisfied() {
        Ok(Json(verification.actual))
    } else {
        Err(ApiError::CountMismatch(verification))
    }
}

/// `POST /graphql`: answer a GraphQL request from expectations or fixtures
pub async fn endpoint(
    State(state): State<AppState>,
    payload: JsonBody<GraphQlRequest>,
) -> Result<Resolution> {
    let Json(request) = payload?;
    state.resolver.resolve_graphql(&request).await
}
