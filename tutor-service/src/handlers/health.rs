use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services::get_metrics;
use crate::startup::AppState;

const SERVICE_NAME: &str = "tutor-service";

/// Liveness probe. Served on `/` and `/health`.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: the configured provider must be callable.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.tutor.provider();
    match provider.health_check() {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": SERVICE_NAME,
                "provider": provider.name(),
                "model": provider.model()
            })),
        ),
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "Provider not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": SERVICE_NAME,
                    "provider": provider.name()
                })),
            )
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
