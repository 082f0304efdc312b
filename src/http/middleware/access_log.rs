//! Access logging and request metrics.
//!
//! Runs inside the request-id layers, so every line carries the ID that the
//! client will see echoed back.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Log one line per request and record its metrics.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        latency_ms = latency.as_secs_f64() * 1000.0,
        cb_state = %state.service.breaker_state(),
        "Request completed"
    );
    metrics::record_request(method.as_str(), status.as_u16(), latency);

    response
}
