use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

const KNOWN_PATHS: [&str; 7] = [
    "/health",
    "/metrics",
    "/login",
    "/register",
    "/save_game1",
    "/save_game2",
    "/",
];

/// Records request count and latency per method/path/status
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), path, status.as_str()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method.as_str(), path])
        .observe(duration);

    response
}

/// Collapse anything outside the fixed route table so that scanners
/// cannot blow up label cardinality.
fn normalize_path(path: &str) -> &'static str {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    KNOWN_PATHS
        .iter()
        .find(|known| **known == trimmed)
        .copied()
        .unwrap_or("other")
}
