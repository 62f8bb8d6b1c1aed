//! Prometheus Metrics Definitions
//!
//! Defines the Agent Network metrics and the `/metrics` scrape handler.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, register_int_gauge,
    CounterVec, Encoder, HistogramVec, IntCounter, IntGauge, TextEncoder,
};

use crate::error::{RpcError, RpcResult};

/// Request latency buckets (seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized on first use
pub static METRICS: Lazy<RpcResult<NetworkMetrics>> = Lazy::new(NetworkMetrics::new);

/// Registered metrics, or `None` if registration failed.
pub fn metrics() -> Option<&'static NetworkMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all Agent Network metrics.
#[derive(Clone)]
pub struct NetworkMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// RPC call counter - labels: method, outcome (ok or error kind)
    pub rpc_calls_total: CounterVec,

    /// RPC call duration histogram - labels: method
    pub rpc_duration_seconds: HistogramVec,

    /// Currently registered agents
    pub registered_agents: IntGauge,

    /// Agents evicted by the liveness sweep
    pub swept_agents_total: IntCounter,
}

fn registration_failed(name: &str, e: prometheus::Error) -> RpcError {
    RpcError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl NetworkMetrics {
    /// Create and register all metrics with the default Prometheus registry.
    pub fn new() -> RpcResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "agentnet_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "agentnet_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            rpc_calls_total: register_counter_vec!(
                "agentnet_rpc_calls_total",
                "Total number of JSON-RPC calls",
                &["method", "outcome"]
            )
            .map_err(|e| registration_failed("rpc_calls_total", e))?,

            rpc_duration_seconds: register_histogram_vec!(
                "agentnet_rpc_duration_seconds",
                "JSON-RPC call duration in seconds",
                &["method"],
                LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("rpc_duration_seconds", e))?,

            registered_agents: register_int_gauge!(
                "agentnet_registered_agents",
                "Current number of registered agents"
            )
            .map_err(|e| registration_failed("registered_agents", e))?,

            swept_agents_total: register_int_counter!(
                "agentnet_swept_agents_total",
                "Agents evicted for missing liveness"
            )
            .map_err(|e| registration_failed("swept_agents_total", e))?,
        })
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one RPC call. `outcome` is `ok` or the error kind.
    pub fn record_rpc_call(&self, method: &str, outcome: &str, duration_secs: f64) {
        self.rpc_calls_total
            .with_label_values(&[method, outcome])
            .inc();
        self.rpc_duration_seconds
            .with_label_values(&[method])
            .observe(duration_secs);
    }

    pub fn set_registered_agents(&self, count: usize) {
        self.registered_agents.set(count as i64);
    }

    pub fn record_swept_agents(&self, count: usize) {
        self.swept_agents_total.inc_by(count as u64);
    }
}

/// Handler for GET /metrics. Returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
