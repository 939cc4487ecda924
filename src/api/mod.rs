pub mod extract;
pub mod health;
pub mod validate;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;

use crate::state::AppState;

/// Build the HTTP router for the extraction service.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_body_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/v1/extract", post(extract::extract_handler))
        .route("/v1/validate", post(validate::validate_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// 400 response for a request body that is not the JSON the route expects.
pub(crate) fn invalid_body(err: &serde_json::Error) -> Response {
    tracing::debug!("rejecting request body: {err}");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "code": "invalid-body",
                "message": err.to_string(),
            }
        })),
    )
        .into_response()
}
