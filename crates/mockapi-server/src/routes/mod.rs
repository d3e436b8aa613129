//! HTTP routes
//!
//! Management endpoints live under `/fixtures`, the GraphQL endpoint at
//! `/graphql`. Every other request is answered by the catch-all resolver.

use axum::Router;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, delete, get, post};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::AppState;
use crate::error::{ApiError, Result};
use crate::observability::{RequestTimer, log_resolved, log_unresolved};
use crate::resolver::{RequestDescriptor, decode_path};

pub mod fixtures;
pub mod graphql;

/// Build the router over shared state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(home))
        .route(
            "/fixtures",
            get(fixtures::list).post(fixtures::write).put(fixtures::write),
        )
        .route(
            "/fixtures/expect-setup",
            post(fixtures::expect_setup).put(fixtures::expect_setup),
        )
        .route("/fixtures/expect/{count}/{method}", get(fixtures::verify))
        .route("/fixtures/expectations", delete(fixtures::clear_expectations))
        .route("/fixtures/files/{file_name}", delete(fixtures::delete_file))
        .route(
            "/fixtures/graphql",
            post(graphql::write)
                .put(graphql::write)
                .delete(graphql::delete),
        )
        .route(
            "/fixtures/graphql/expect-setup",
            post(graphql::expect_setup).put(graphql::expect_setup),
        )
        .route("/fixtures/graphql/expect/{count}", post(graphql::verify))
        .route(
            "/fixtures/{method}",
            get(fixtures::probe).delete(fixtures::delete),
        )
        .route("/graphql", post(graphql::endpoint))
        .fallback(catch_all)
        .with_state(state)
}

/// `/`: the home page from the web root
async fn home(State(state): State<AppState>) -> Result<Html<String>> {
    let Some(web_root) = &state.web_root else {
        return Err(ApiError::not_found("No web root configured"));
    };

    let index = web_root.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(page) => Ok(Html(page)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ApiError::not_found(
            format!("Home page not found: {}", index.display()),
        )),
        Err(err) => Err(ApiError::Internal(format!(
            "Failed to read {}: {err}",
            index.display()
        ))),
    }
}

/// Any other request: resolve against expectations and fixtures
async fn catch_all(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timer = RequestTimer::start();
    let request = RequestDescriptor::new(method.as_str(), decode_path(uri.path()))
        .with_query(uri.query())
        .with_headers(headers)
        .with_body(body);

    match state.resolver.resolve(&request).await {
        Ok(resolution) => {
            log_resolved(
                &request.method,
                &request.path,
                resolution.source,
                resolution.status.as_u16(),
                &timer,
            );
            resolution.into_response()
        }
        Err(err) => {
            log_unresolved(
                &request.method,
                &request.path,
                err.status_code().as_u16(),
                &timer,
            );
            err.into_response()
        }
    }
}
