use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// GET /
pub async fn read_root() -> impl IntoResponse {
    Json(json!({"message": "Garmin Connect Microservice is running!"}))
}

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "garmin-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check endpoint for K8s readiness probes.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.garmin.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "client": state.garmin.name()})),
        ),
        Err(e) => {
            tracing::warn!(client = state.garmin.name(), "Garmin client not ready: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "client": state.garmin.name(),
                    "error": e.to_string()
                })),
            )
        }
    }
}
