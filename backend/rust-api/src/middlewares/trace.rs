use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

#[derive(Clone, Debug)]
pub struct RequestTraceContext {
    pub trace_id: String,
}

/// Reuses the caller's `x-trace-id` or mints one, and echoes it on the response.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let trace_id = match incoming {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request
                    .headers_mut()
                    .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
            }
            id
        }
    };

    request.extensions_mut().insert(RequestTraceContext {
        trace_id: trace_id.clone(),
    });

    tracing::debug!(
        trace_id = %trace_id,
        method = %request.method(),
        path = request.uri().path(),
        "request received"
    );

    let mut response = next.run(request).await;

    if !response.headers().contains_key(TRACE_ID_HEADER) {
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
    }

    response
}
