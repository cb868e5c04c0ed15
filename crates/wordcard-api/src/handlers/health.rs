//! Health Check Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    /// Database ping succeeded
    pub database: bool,
}

/// Health check endpoint
///
/// 200 when the database answers, 503 otherwise.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let health = state.db.health_check().await;

    if health.healthy {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: true,
            }),
        )
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                database: false,
            }),
        )
    }
}
