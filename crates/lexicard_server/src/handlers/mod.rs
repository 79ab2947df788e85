//! HTTP request handlers.

/// Lesson list/read/save endpoints.
pub mod lessons;

use crate::AppState;
use axum::{extract::State, Json};
use lexicard_core::models::api::HealthResponse;

/// Liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running".to_string(),
        port: state.config.port,
    })
}
