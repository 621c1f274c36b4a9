//! HTTP layer: route handlers, DTOs, and router composition.
//!
//! [`app`] assembles the complete service: pages, region endpoints, system
//! endpoints, OpenAPI docs, the `/ws` observer channel, and static files
//! with a 404 page for everything else.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::any::Any;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::error::TrackerError;
use crate::ws::handler::ws_handler;

/// Builds the router with all HTTP endpoints (no websocket, no static files).
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(openapi::routes())
}

/// Builds the complete application.
///
/// Unmatched paths are looked up in `static_dir`; misses render the 404
/// error page, as do known paths called with the wrong method. Handler
/// panics are rendered as a 500 error page.
pub fn app(state: AppState, static_dir: impl AsRef<Path>, request_timeout: Duration) -> Router {
    let static_files = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(handlers::pages::not_found.into_service());

    build_router()
        .route("/ws", get(ws_handler))
        .method_not_allowed_fallback(handlers::pages::not_found)
        .fallback_service(static_files)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("handler panicked");
    TrackerError::Internal(detail.to_string()).into_response()
}
