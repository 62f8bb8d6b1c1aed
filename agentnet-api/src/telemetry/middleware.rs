//! Axum Middleware for HTTP Request Metrics
//!
//! Wraps every request in a tracing span carrying a request id and records
//! Prometheus metrics once the response is produced.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::metrics::metrics;
use crate::constants::{HEALTH_PATH, METRICS_PATH, RPC_PATH};

/// Header used to correlate a request with its log lines.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Collapse unknown paths into one label to bound metric cardinality.
fn normalize_path(path: &str) -> &'static str {
    match path {
        RPC_PATH => RPC_PATH,
        HEALTH_PATH => HEALTH_PATH,
        METRICS_PATH => METRICS_PATH,
        _ => "other",
    }
}

/// Observability middleware for Axum.
///
/// Reuses an incoming `x-request-id` or generates a UUIDv7 one, echoes it
/// on the response and records request count and latency.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = normalize_path(&path);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.route = route,
        request_id = %request_id,
    );

    let mut response = next.run(request).instrument(span).await;

    let status = response.status();
    let duration = start.elapsed();
    if let Some(m) = metrics() {
        m.record_http_request(method.as_str(), route, status.as_u16(), duration.as_secs_f64());
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    tracing::debug!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        request_id = %request_id,
        "Request completed"
    );

    response
}
