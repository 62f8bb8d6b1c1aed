//! Health check endpoint. No authentication, no dependencies.

use axum::{routing::get, Router};

use crate::constants::HEALTH_PATH;
use crate::state::AppState;

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

pub fn create_router() -> Router<AppState> {
    Router::new().route(HEALTH_PATH, get(health))
}
