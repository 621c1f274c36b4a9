//! HTML pages: landing page and the 404 fallback.

use axum::Router;
use axum::http::Uri;
use axum::response::Html;
use axum::routing::get;

use crate::app_state::AppState;
use crate::error::TrackerError;
use crate::views;

/// `GET /`: Landing page.
pub async fn index_handler() -> Html<String> {
    views::index()
}

/// Fallback for unmatched paths and for known paths hit with the wrong method.
pub async fn not_found(uri: Uri) -> TrackerError {
    TrackerError::RouteNotFound(uri.path().to_string())
}

/// Page routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index_handler))
}
