use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use super::invalid_body;
use crate::fc::ParsedToolRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractBody {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub requests: Vec<ParsedToolRequest>,
    /// One diagnostic per block that failed to build.
    pub skipped: Vec<String>,
}

/// `POST /v1/extract`: pull every valid tool request out of `text`.
pub async fn extract_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    let payload: ExtractBody = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(err) => return invalid_body(&err),
    };

    let skipped = Mutex::new(Vec::new());
    let sink = |message: &str| {
        tracing::warn!("{message}");
        skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    };

    let result = state.extractor.extract_with(&payload.text, &sink);
    match result {
        Ok(requests) => Json(ExtractResponse {
            requests,
            skipped: skipped.into_inner().unwrap_or_else(PoisonError::into_inner),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}
