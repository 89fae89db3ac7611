// src/handlers/health.rs
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::registry::Registry;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// GET /healthz
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /metrics
pub async fn metrics_endpoint(State(registry): State<Registry>) -> impl IntoResponse {
    let metrics_text = registry.render(); // Render all registered families
    (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], metrics_text)
}
