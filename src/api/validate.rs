use axum::response::{IntoResponse, Json, Response};

use super::invalid_body;
use crate::error::ToolCallError;
use crate::fc::{validate, ToolRequestCandidate};

/// `POST /v1/validate`: run the request validator over a candidate supplied
/// as JSON.
pub async fn validate_handler(body: String) -> Response {
    let candidate: ToolRequestCandidate = match serde_json::from_str(&body) {
        Ok(candidate) => candidate,
        Err(err) => return invalid_body(&err),
    };

    match validate(candidate) {
        Ok(request) => Json(request).into_response(),
        Err(failure) => ToolCallError::from(failure).into_response(),
    }
}
