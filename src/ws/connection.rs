//! WebSocket observer connection.
//!
//! Forwards every tracker event to the observer and answers its commands.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage};
use crate::broker::BrokerHandle;
use crate::domain::TrackerEvent;
use crate::error::TrackerError;
use crate::service::EventHub;

/// Runs the read/write loop for a single observer connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards every event from the [`broadcast::Receiver`] to the client.
///
/// Returns when either side closes.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<TrackerEvent>,
    hub: Arc<EventHub>,
    broker: BrokerHandle,
) {
    let session = uuid::Uuid::new_v4();
    tracing::debug!(%session, "observer connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &hub, &broker).await;
                        if ws_tx.send(Message::text(response.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%session, error = %e, "observer socket error");
                        break;
                    }
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        let msg = WsMessage::event(&event);
                        if ws_tx.send(Message::text(msg.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%session, lagged = n, "observer lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(%session, "observer disconnected");
}

/// Handles a text message from the client, returning the reply envelope.
async fn handle_text_message(text: &str, hub: &EventHub, broker: &BrokerHandle) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Counters => match hub.counters() {
            Ok(regions) => WsMessage::response(
                msg.id,
                serde_json::json!({
                    "regions": regions,
                    "publishes": hub.publish_count(),
                }),
            ),
            Err(e) => error_reply(msg.id, &e),
        },
        WsCommand::Publish { topic, payload } => match broker.publish(&topic, payload).await {
            Ok(delivered) => WsMessage::response(
                msg.id,
                serde_json::json!({
                    "topic": topic,
                    "delivered": delivered,
                }),
            ),
            Err(e) => error_reply(msg.id, &TrackerError::from(e)),
        },
    }
}

fn error_reply(id: String, err: &TrackerError) -> WsMessage {
    WsMessage::error(id, err.status_code().as_u16(), err.to_string())
}
