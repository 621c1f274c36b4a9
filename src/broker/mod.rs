//! Embedded MQTT 3.1.1 broker.
//!
//! A small broker: QoS 0 routing with `+`/`#` wildcards, the QoS 1/2
//! acknowledgment handshakes towards publishers, keep-alive enforcement, no
//! retained messages and no persistent sessions. Framing and topic rules come
//! from [`mqttbytes`]; this module only owns the connection glue. Its purpose
//! is to feed lifecycle notifications ([`BrokerEvent`]) to the tracker and to
//! accept messages published back through a [`BrokerHandle`].
//!
//! ```text
//! TcpListener ──accept──▶ session task (one per client)
//!                           │  decode ─▶ route ─▶ other sessions' queues
//!                           └─ emit ─▶ broadcast<BrokerEvent> ─▶ EventHub
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod server;
mod session;
pub mod topics;

pub use config::BrokerConfig;
pub use error::BrokerError;
pub use event::{BrokerEvent, ClientInfo, PublishedMessage};
pub use mqttbytes::QoS;
pub use mqttbytes::v4::Packet;
pub use server::{Broker, BrokerHandle};
