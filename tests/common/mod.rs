//! Shared helpers for the integration tests.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use mqtt_tracker::api;
use mqtt_tracker::app_state::AppState;
use mqtt_tracker::broker::codec;
use mqtt_tracker::broker::{Broker, BrokerConfig, BrokerHandle, Packet, QoS};
use mqttbytes::v4::{Connect, ConnectReturnCode, SubAck, Subscribe, SubscribeFilter};
use mqtt_tracker::domain::{EventBus, TrackerEvent};
use mqtt_tracker::service::EventHub;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// How long a test waits for any single network event.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Directory holding `app.js` and `style.css`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");

/// Websocket client stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn localhost() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// Builds a hub backed by a bound (but not running) broker.
pub async fn hub() -> (Arc<EventHub>, Broker) {
    let Ok(broker) = Broker::bind(BrokerConfig::with_addr(localhost())).await else {
        panic!("failed to bind broker");
    };
    let hub = Arc::new(EventHub::new(EventBus::new(256), broker.handle()));
    (hub, broker)
}

/// A fully running tracker: broker, broker listener, and HTTP server.
#[derive(Debug)]
pub struct TestTracker {
    pub http_addr: SocketAddr,
    pub mqtt_addr: SocketAddr,
    pub hub: Arc<EventHub>,
    pub broker: BrokerHandle,
}

impl TestTracker {
    pub async fn start() -> Self {
        let (hub, broker) = hub().await;
        let Ok(mqtt_addr) = broker.local_addr() else {
            panic!("broker has no local address");
        };
        let handle = broker.handle();
        let _listener_task = hub.spawn_broker_listener();
        let _broker_task = broker.spawn();

        let app = api::app(AppState::new(Arc::clone(&hub)), STATIC_DIR, TIMEOUT);
        let Ok(listener) = TcpListener::bind(localhost()).await else {
            panic!("failed to bind http listener");
        };
        let Ok(http_addr) = listener.local_addr() else {
            panic!("http listener has no local address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            http_addr,
            mqtt_addr,
            hub,
            broker: handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.http_addr)
    }

    pub async fn observer(&self) -> WsStream {
        let url = format!("ws://{}/ws", self.http_addr);
        let Ok((ws, _)) = tokio_tungstenite::connect_async(url).await else {
            panic!("websocket handshake failed");
        };
        ws
    }
}

/// Next text frame from the websocket, parsed as JSON.
pub async fn next_json(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(TIMEOUT, ws.next()).await else {
            panic!("no websocket message received");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("websocket frame is not JSON: {text}");
            };
            return value;
        }
    }
}

/// Skips frames until one with the given `type` arrives.
pub async fn next_of_type(ws: &mut WsStream, msg_type: &str) -> serde_json::Value {
    loop {
        let value = next_json(ws).await;
        if value["type"] == msg_type {
            return value;
        }
    }
}

/// Next event published on the hub's event bus.
pub async fn next_event(rx: &mut broadcast::Receiver<TrackerEvent>) -> TrackerEvent {
    let Ok(Ok(event)) = tokio::time::timeout(TIMEOUT, rx.recv()).await else {
        panic!("no tracker event received");
    };
    event
}

/// Minimal MQTT 3.1.1 client speaking raw packets.
#[derive(Debug)]
pub struct MqttClient {
    stream: TcpStream,
    buf: BytesMut,
}

impl MqttClient {
    /// Connects and completes the CONNECT/CONNACK handshake.
    pub async fn connect(addr: SocketAddr, client_id: &str) -> Self {
        Self::connect_with(addr, Connect::new(client_id)).await
    }

    /// Like [`Self::connect`] with a caller-built CONNECT packet.
    pub async fn connect_with(addr: SocketAddr, connect: Connect) -> Self {
        let mut client = Self::open(addr).await;
        client.send(&Packet::Connect(connect)).await;
        match client.recv().await {
            Packet::ConnAck(ack) if ack.code == ConnectReturnCode::Success => client,
            other => panic!("expected an accepted CONNACK, got {other:?}"),
        }
    }

    /// Opens the TCP connection without sending anything.
    pub async fn open(addr: SocketAddr) -> Self {
        let Ok(stream) = TcpStream::connect(addr).await else {
            panic!("failed to connect to broker at {addr}");
        };
        Self {
            stream,
            buf: BytesMut::new(),
        }
    }

    pub async fn send(&mut self, packet: &Packet) {
        let mut out = BytesMut::new();
        let Ok(_) = codec::encode(packet, &mut out) else {
            panic!("failed to encode {}", codec::name(packet));
        };
        self.send_raw(&out).await;
    }

    /// Writes bytes as-is, for frames the codec refuses to build.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let Ok(()) = self.stream.write_all(bytes).await else {
            panic!("failed to write {} bytes", bytes.len());
        };
    }

    pub async fn recv(&mut self) -> Packet {
        let read = async {
            loop {
                match codec::decode(&mut self.buf, 1 << 20) {
                    Ok(Some(packet)) => return packet,
                    Ok(None) => {}
                    Err(e) => panic!("failed to decode packet: {e}"),
                }
                match self.stream.read_buf(&mut self.buf).await {
                    Ok(0) => panic!("broker closed the connection"),
                    Ok(_) => {}
                    Err(e) => panic!("read failed: {e}"),
                }
            }
        };
        let Ok(packet) = tokio::time::timeout(TIMEOUT, read).await else {
            panic!("timed out waiting for a packet");
        };
        packet
    }

    /// Waits until the broker closes the connection.
    pub async fn expect_closed(&mut self) {
        let closed = async {
            loop {
                match self.stream.read_buf(&mut self.buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
            }
        };
        if tokio::time::timeout(TIMEOUT, closed).await.is_err() {
            panic!("broker kept the connection open");
        }
    }

    pub async fn subscribe(&mut self, pkid: u16, filter: &str) -> SubAck {
        self.send(&Packet::Subscribe(Subscribe {
            pkid,
            filters: vec![SubscribeFilter {
                path: filter.to_string(),
                qos: QoS::AtMostOnce,
            }],
        }))
        .await;
        match self.recv().await {
            Packet::SubAck(ack) => ack,
            other => panic!("expected SUBACK, got {other:?}"),
        }
    }
}
