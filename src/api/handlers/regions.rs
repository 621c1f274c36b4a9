//! Region occupancy endpoints.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::post;

use crate::app_state::AppState;
use crate::error::TrackerError;

/// `POST /enter/{id}`: Someone entered a region.
///
/// Increments the region counter and broadcasts `entered-region` to every
/// websocket observer.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRegion`] (400) if `id` is not in `1..=4`.
#[utoipa::path(
    post,
    path = "/enter/{id}",
    tag = "Regions",
    summary = "Enter a region",
    description = "Increments the occupancy counter of a region and notifies observers.",
    params(("id" = String, Path, description = "Region identifier (1-4)")),
    responses(
        (status = 200, description = "Counter incremented", body = String),
        (status = 400, description = "Invalid region identifier"),
    )
)]
pub async fn enter_region(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, TrackerError> {
    let update = state.hub.enter_region(&id)?;
    Ok(format!("entered-region-{}", update.region))
}

/// `POST /leave/{id}`: Someone left a region.
///
/// Decrements the region counter and broadcasts `leave-region` to every
/// websocket observer.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRegion`] (400) if `id` is not in `1..=4`.
#[utoipa::path(
    post,
    path = "/leave/{id}",
    tag = "Regions",
    summary = "Leave a region",
    description = "Decrements the occupancy counter of a region and notifies observers.",
    params(("id" = String, Path, description = "Region identifier (1-4)")),
    responses(
        (status = 200, description = "Counter decremented", body = String),
        (status = 400, description = "Invalid region identifier"),
    )
)]
pub async fn leave_region(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, TrackerError> {
    let update = state.hub.leave_region(&id)?;
    Ok(format!("leave-region-{}", update.region))
}

/// Region routes, with and without a trailing slash.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/enter/{id}", post(enter_region))
        .route("/enter/{id}/", post(enter_region))
        .route("/leave/{id}", post(leave_region))
        .route("/leave/{id}/", post(leave_region))
}
