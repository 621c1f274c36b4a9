//! Tracker configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::broker::BrokerConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level tracker configuration.
///
/// Loaded once at startup via [`TrackerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Socket address of the HTTP + websocket server (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Socket address of the embedded MQTT broker (e.g. `0.0.0.0:1883`).
    pub mqtt_listen_addr: SocketAddr,

    /// Maximum concurrent MQTT connections (0 = unlimited).
    pub mqtt_max_connections: usize,

    /// Maximum inbound MQTT packet size in bytes.
    pub mqtt_max_packet_size: usize,

    /// Seconds a new MQTT connection has to send CONNECT.
    pub mqtt_connect_timeout_secs: u64,

    /// Capacity of the observer EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Capacity of the broker lifecycle event channel.
    pub broker_event_capacity: usize,

    /// Directory served for unmatched GET requests (`app.js`, `style.css`).
    pub static_dir: PathBuf,

    /// Per-request timeout for HTTP handlers.
    pub request_timeout_secs: u64,

    /// Log output format.
    pub log_format: LogFormat,
}

impl TrackerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` or `MQTT_LISTEN_ADDR` is set but
    /// cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;
        let mqtt_listen_addr: SocketAddr = std::env::var("MQTT_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:1883".to_string())
            .parse()?;

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            mqtt_listen_addr,
            mqtt_max_connections: parse_env("MQTT_MAX_CONNECTIONS", 0),
            mqtt_max_packet_size: parse_env("MQTT_MAX_PACKET_SIZE", 256 * 1024),
            mqtt_connect_timeout_secs: parse_env("MQTT_CONNECT_TIMEOUT_SECS", 10),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", 1024),
            broker_event_capacity: parse_env("BROKER_EVENT_CAPACITY", 1024),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            log_format,
        })
    }

    /// Broker settings derived from this configuration.
    #[must_use]
    pub fn broker_config(&self) -> BrokerConfig {
        BrokerConfig::with_addr(self.mqtt_listen_addr)
            .max_connections(self.mqtt_max_connections)
            .max_packet_size(self.mqtt_max_packet_size)
            .connect_timeout(Duration::from_secs(self.mqtt_connect_timeout_secs))
            .event_capacity(self.broker_event_capacity)
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            mqtt_listen_addr: SocketAddr::from(([0, 0, 0, 0], 1883)),
            mqtt_max_connections: 0,
            mqtt_max_packet_size: 256 * 1024,
            mqtt_connect_timeout_secs: 10,
            event_bus_capacity: 1024,
            broker_event_capacity: 1024,
            static_dir: PathBuf::from("public"),
            request_timeout_secs: 30,
            log_format: LogFormat::Pretty,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
