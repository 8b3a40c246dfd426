// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

/// Liveness probe. Also reports whether an upstream API key is configured.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "llm_configured": state.generator.is_some(),
    }))
}
