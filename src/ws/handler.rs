//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws`: Upgrade HTTP connection to an observer WebSocket.
///
/// The event receiver is subscribed before the upgrade completes, and the
/// session gets its own clone of the broker handle.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let event_rx = state.hub.event_bus().subscribe();
    let broker = state.hub.broker().clone();
    let hub = Arc::clone(&state.hub);

    ws.on_upgrade(move |socket| run_connection(socket, event_rx, hub, broker))
}
