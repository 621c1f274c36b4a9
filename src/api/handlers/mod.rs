//! HTTP endpoint handlers organized by resource.

pub mod pages;
pub mod regions;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all handler routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pages::routes())
        .merge(regions::routes())
        .merge(system::routes())
}
