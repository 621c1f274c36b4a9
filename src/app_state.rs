//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::EventHub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event hub owning the region counters and observer fan-out.
    pub hub: Arc<EventHub>,
}

impl AppState {
    /// Wraps the hub for use as router state.
    #[must_use]
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self { hub }
    }
}
