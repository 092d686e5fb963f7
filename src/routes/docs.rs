use super::{health, waitlist};
use crate::state::AppState;
use axum::{
    http::{
        header::{self, ACCEPT},
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use utoipa::OpenApi;

/// Documentation for the service. Can be converted into JSON or YAML.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::is_alive,
        health::build_info,
        waitlist::join_waitlist,
        crate::metrics::metrics_endpoint,
    ),
    components(schemas(
        health::BuildInfo,
        waitlist::WaitlistRequest,
        waitlist::WaitlistResponse,
        waitlist::ErrorResponse,
    ))
)]
struct ApiDoc;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/docs/openapi", get(serve_openapi_docs))
        .route("/docs/openapi.json", get(serve_openapi_docs_as_json))
        .route("/docs/openapi.yaml", get(serve_openapi_docs_as_yaml))
}

/// Serve OpenApi docs based on the `Accept` header.
#[tracing::instrument(skip(headers))]
pub async fn serve_openapi_docs(headers: HeaderMap) -> impl IntoResponse {
    match headers.get(ACCEPT).and_then(|x| x.to_str().ok()) {
        Some("application/yaml") => serve_openapi_docs_as_yaml().await.into_response(),
        _ => serve_openapi_docs_as_json().await.into_response(),
    }
}

/// Endpoint to serve OpenApi docs as JSON.
#[tracing::instrument]
pub async fn serve_openapi_docs_as_json() -> impl IntoResponse {
    ApiDoc::openapi()
        .to_json()
        .map(|docs| ([(header::CONTENT_TYPE, "application/json")], docs))
        .map_err(|e| {
            tracing::error!("Failed to serialize OpenApi docs as JSON: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Endpoint to serve OpenApi docs as YAML.
#[tracing::instrument]
pub async fn serve_openapi_docs_as_yaml() -> impl IntoResponse {
    ApiDoc::openapi()
        .to_yaml()
        .map(|docs| ([(header::CONTENT_TYPE, "application/yaml")], docs))
        .map_err(|e| {
            tracing::error!("Failed to serialize OpenApi docs as YAML: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
