//! Agent Network Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics for the
//! server. Neither depends on an external collector.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics, metrics_handler, NetworkMetrics, METRICS};
pub use middleware::{observability_middleware, REQUEST_ID_HEADER};
pub use tracer::{init_tracing, LogFormat, TelemetryConfig};
