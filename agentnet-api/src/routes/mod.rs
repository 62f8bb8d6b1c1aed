//! HTTP routes of the Agent Network server.
//!
//! - `POST /rpc`: the JSON-RPC endpoint
//! - `GET /health`: plain liveness
//! - `GET /metrics`: Prometheus text exposition, unless metrics are disabled
//!
//! Anything else is a 404.

pub mod health;
pub mod rpc;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::NetworkConfig;
use crate::constants::{METRICS_PATH, RPC_PATH};
use crate::service::NetworkService;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware, REQUEST_ID_HEADER};

const CORS_MAX_AGE_SECS: u64 = 3600;

/// Build the CORS layer from NetworkConfig.
///
/// With no configured origins every origin is allowed.
fn build_cors_layer(config: &NetworkConfig) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, request_id.clone()])
        .expose_headers([request_id])
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS));

    if config.cors_allow_all() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Create the complete server router.
pub fn create_router(service: NetworkService, config: &NetworkConfig) -> Router {
    let cors = build_cors_layer(config);

    let mut router = Router::new()
        .route(RPC_PATH, post(rpc::handle_rpc))
        .merge(health::create_router());
    if config.telemetry.metrics_enabled {
        router = router.route(METRICS_PATH, get(metrics_handler));
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .with_state(AppState::new(service))
}
