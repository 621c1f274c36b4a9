//! System endpoints: health check and counter snapshot.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{CountersResponse, HealthResponse};
use crate::app_state::AppState;
use crate::error::TrackerError;

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, observer count and connected MQTT clients.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let broker = state.hub.broker();
    let status = if broker.is_shut_down() {
        "degraded"
    } else {
        "healthy"
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            observers: state.hub.event_bus().receiver_count(),
            mqtt_clients: broker.client_count().await,
        }),
    )
}

/// `GET /api/v1/counters`: Current region counters.
///
/// # Errors
///
/// Returns [`TrackerError::Internal`] if the counters cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/counters",
    tag = "Regions",
    summary = "Region counters",
    description = "Returns the four region counters and the number of MQTT client publishes seen.",
    responses(
        (status = 200, description = "Counter snapshot", body = CountersResponse),
    )
)]
pub async fn counters_handler(
    State(state): State<AppState>,
) -> Result<Json<CountersResponse>, TrackerError> {
    Ok(Json(CountersResponse {
        regions: state.hub.counters()?,
        publishes: state.hub.publish_count(),
    }))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/counters", get(counters_handler))
}
