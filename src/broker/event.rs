//! Lifecycle notifications emitted by the broker.

use std::net::SocketAddr;

use bytes::Bytes;

use mqttbytes::QoS;
use mqttbytes::v4::Publish;

/// Identity of a connected MQTT client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client identifier from CONNECT (or generated when empty).
    pub id: String,
    /// Remote socket address.
    pub addr: SocketAddr,
}

/// Application message accepted by the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    /// Topic name.
    pub topic: String,
    /// Raw payload.
    pub payload: Bytes,
    /// QoS requested by the publisher.
    pub qos: QoS,
    /// Retain flag as sent by the publisher.
    pub retain: bool,
}

impl PublishedMessage {
    /// JSON view of the message: `{topic, payload, qos, retain}` with the
    /// payload decoded as lossy UTF-8.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "topic": self.topic,
            "payload": String::from_utf8_lossy(&self.payload),
            "qos": self.qos as u8,
            "retain": self.retain,
        })
    }
}

impl From<&Publish> for PublishedMessage {
    fn from(publish: &Publish) -> Self {
        Self {
            topic: publish.topic.clone(),
            payload: publish.payload.clone(),
            qos: publish.qos,
            retain: publish.retain,
        }
    }
}

/// Broker lifecycle notification.
///
/// `client` is `None` for messages originating inside the process (for
/// example a publish issued through [`super::BrokerHandle::publish`]).
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    /// A client completed the CONNECT handshake.
    ClientConnected {
        /// Connected client.
        client: ClientInfo,
    },
    /// A client connection ended, gracefully or not.
    ClientDisconnected {
        /// Disconnected client.
        client: ClientInfo,
    },
    /// A message was accepted for routing.
    Published {
        /// Publisher, if any.
        client: Option<ClientInfo>,
        /// The accepted message.
        message: PublishedMessage,
    },
    /// A topic filter subscription was granted.
    Subscribed {
        /// Subscriber, if any.
        client: Option<ClientInfo>,
        /// Granted topic filter.
        topic: String,
    },
    /// A topic filter subscription was removed.
    Unsubscribed {
        /// Subscriber, if any.
        client: Option<ClientInfo>,
        /// Removed topic filter.
        topic: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_message_json_view() {
        let message = PublishedMessage {
            topic: "regions/1".to_string(),
            payload: Bytes::from_static(b"enter"),
            qos: QoS::AtLeastOnce,
            retain: false,
        };
        assert_eq!(
            message.to_json(),
            serde_json::json!({
                "topic": "regions/1",
                "payload": "enter",
                "qos": 1,
                "retain": false,
            })
        );
    }
}
