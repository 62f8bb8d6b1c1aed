//! Shared application state for the Axum router.

use crate::service::NetworkService;

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub service: NetworkService,
}

impl AppState {
    pub fn new(service: NetworkService) -> Self {
        Self { service }
    }
}

crate::impl_from_ref!(NetworkService, service);
