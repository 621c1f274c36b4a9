//! # mqtt-tracker
//!
//! Region occupancy tracker bridging an embedded MQTT broker, websocket
//! observers, and a small HTTP API.
//!
//! HTTP clients report people entering and leaving one of four regions.
//! Every change is pushed to connected websocket observers, together with
//! a debug log of MQTT client activity on the embedded broker.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)          MQTT clients
//!     │                                   │
//!     ├── HTTP Handlers (api/)            │
//!     ├── WS Handler (ws/)                │
//!     │                                   │
//!     ├── EventHub (service/) ◄── BrokerEvent ── Broker (broker/)
//!     │       │
//!     ├── RegionCounterStore (domain/)
//!     └── EventBus (domain/) ──► observers
//! ```

pub mod api;
pub mod app_state;
pub mod broker;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod views;
pub mod ws;
