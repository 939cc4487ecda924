use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check handler.
/// Returns JSON with status and extraction settings.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "toolmark-rs is running",
        "config": {
            "extraction": {
                "block_tag": state.extractor.markers().tag(),
                "max_nesting_depth": config.extraction.max_nesting_depth,
            },
            "max_body_bytes": config.server.max_body_bytes,
            "log_level": config.features.log_level,
        }
    }))
}
