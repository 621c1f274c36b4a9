//! WebSocket layer: observer connections and command handling.
//!
//! The endpoint at `/ws` streams every region update and broker debug
//! record to the observer and accepts `counters` and `publish` commands.

pub mod connection;
pub mod handler;
pub mod messages;
