//! Request logging middleware.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Requests slower than this are logged at WARN.
const SLOW_REQUEST: Duration = Duration::from_millis(100);

/// Log each request with its status and latency.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    tracing::debug!(%method, %uri, "request");

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    if elapsed > SLOW_REQUEST {
        tracing::warn!(%method, %uri, elapsed_ms = elapsed.as_millis(), "slow request");
    }
    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = elapsed.as_millis(),
        "response"
    );

    response
}
