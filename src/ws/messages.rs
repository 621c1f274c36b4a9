//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TrackerEvent;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// Channel name of an event (`debug`, `entered-region`, `leave-region`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Wraps a tracker event for delivery to an observer.
    #[must_use]
    pub fn event(event: &TrackerEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Event,
            event: Some(event.event_name().to_string()),
            timestamp: Utc::now(),
            payload: event.payload(),
        }
    }

    /// Response to the command identified by `id`.
    #[must_use]
    pub fn response(id: String, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Response,
            event: None,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Error reply to the command identified by `id`.
    #[must_use]
    pub fn error(id: String, code: u16, message: impl Into<String>) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Error,
            event: None,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": code,
                "message": message.into(),
            }),
        }
    }

    /// Serializes the envelope to JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Request the current counter snapshot.
    Counters,
    /// Publish a message into the MQTT broker.
    Publish {
        /// Topic name (no wildcards).
        topic: String,
        /// UTF-8 payload.
        #[serde(default)]
        payload: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Region, RegionUpdate};

    #[test]
    fn event_envelope_carries_name_and_payload() {
        let Ok(region) = Region::new(2) else {
            panic!("region 2 should be valid");
        };
        let msg = WsMessage::event(&TrackerEvent::EnteredRegion(RegionUpdate { region, count: 3 }));
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&msg.to_json()) else {
            panic!("envelope should be valid JSON");
        };
        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "entered-region");
        assert_eq!(value["payload"], serde_json::json!({"region": 2, "count": 3}));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn command_envelope_parses_without_timestamp() {
        let text = r#"{"id":"7","type":"command","payload":{"command":"publish","topic":"a/b","payload":"hi"}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
            panic!("command envelope should parse");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        assert!(msg.event.is_none());
        let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
            panic!("publish command should parse");
        };
        assert_eq!(
            command,
            WsCommand::Publish {
                topic: "a/b".to_string(),
                payload: "hi".to_string(),
            }
        );
    }

    #[test]
    fn response_omits_event_field() {
        let json = WsMessage::response("1".to_string(), serde_json::json!({})).to_json();
        assert!(!json.contains("\"event\""));
        assert!(json.contains("\"type\":\"response\""));
    }
}
