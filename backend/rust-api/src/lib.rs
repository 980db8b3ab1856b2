//! Behavioral assessment battery: mini-game engines and scorers, the
//! client-side session recorder, and the HTTP persistence service that
//! stores participants and their per-session scores.

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod games;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod recorder;
pub mod services;
pub mod storage;

pub use config::Config;
pub use services::AppState;

/// Unhandled failures surface as `500 {"message": "Server error", "error": ...}`.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "message": "Server error", "error": detail })),
    )
        .into_response()
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/save_game1", post(handlers::results::save_game1))
        .route("/save_game2", post(handlers::results::save_game2))
        .with_state(app_state)
        .layer(middlewares::cors::cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(
            middlewares::cors::preflight_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn panic_body(payload: Box<dyn Any + Send + 'static>) -> (StatusCode, serde_json::Value) {
        let response = handle_panic(payload);
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn panics_render_server_error_with_detail() {
        let (status, body) = panic_body(Box::new("boom")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
        assert_eq!(body["error"], "boom");

        let (_, body) = panic_body(Box::new(String::from("index out of bounds"))).await;
        assert_eq!(body["error"], "index out of bounds");

        let (_, body) = panic_body(Box::new(42_u32)).await;
        assert_eq!(body["error"], "unknown panic");
    }
}
