use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod auth;
pub mod results;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status_code, status, storage) = match state.users.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", json!({ "status": "healthy" })),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "degraded",
            json!({ "status": "unhealthy", "error": format!("{:#}", e) }),
        ),
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "mindtrack-api",
            "version": env!("CARGO_PKG_VERSION"),
            "storage": storage
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// HTTP Basic auth for /metrics against the configured `user:password`
pub async fn metrics_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let encoded = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    if credentials != state.config.metrics_auth {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
