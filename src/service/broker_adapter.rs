//! Translation of broker lifecycle events into observer debug records.

use crate::broker::BrokerEvent;
use crate::domain::{DebugKind, DebugRecord};

/// Stateless mapping from [`BrokerEvent`] to [`DebugRecord`].
///
/// Events without an originating client (messages published from inside
/// the process) produce no record.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokerEventAdapter;

impl BrokerEventAdapter {
    /// Normalizes one broker event, or returns `None` if it should not be
    /// shown to observers.
    #[must_use]
    pub fn normalize(event: &BrokerEvent) -> Option<DebugRecord> {
        let record = match event {
            BrokerEvent::ClientConnected { client } => DebugRecord::new(
                DebugKind::Client,
                format!("New client connected: {}", client.id),
            ),
            BrokerEvent::ClientDisconnected { client } => DebugRecord::new(
                DebugKind::Client,
                format!("Client \"{}\" has disconnected", client.id),
            ),
            BrokerEvent::Published {
                client: Some(client),
                message,
            } => DebugRecord::new(
                DebugKind::Publish,
                format!("Client \"{}\" published \"{}\"", client.id, message.to_json()),
            ),
            BrokerEvent::Subscribed {
                client: Some(client),
                topic,
            } => DebugRecord::new(
                DebugKind::Subscribe,
                format!("Client \"{}\" subscribed to \"{topic}\"", client.id),
            ),
            BrokerEvent::Unsubscribed {
                client: Some(client),
                topic,
            } => DebugRecord::new(
                DebugKind::Subscribe,
                format!("Client \"{}\" unsubscribed from \"{topic}\"", client.id),
            ),
            BrokerEvent::Published { client: None, .. }
            | BrokerEvent::Subscribed { client: None, .. }
            | BrokerEvent::Unsubscribed { client: None, .. } => return None,
        };
        Some(record)
    }
}
