//! Embedded broker configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Broker configuration options.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Address to accept MQTT connections on.
    pub bind_addr: SocketAddr,

    /// Maximum concurrent MQTT connections (0 = unlimited).
    pub max_connections: usize,

    /// Maximum remaining length of an inbound packet, in bytes.
    pub max_packet_size: usize,

    /// Time a new connection has to send CONNECT.
    pub connect_timeout: Duration,

    /// Capacity of the lifecycle event broadcast channel.
    pub event_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1883)),
            max_connections: 0,
            max_packet_size: 256 * 1024,
            connect_timeout: Duration::from_secs(10),
            event_capacity: 1024,
        }
    }
}

impl BrokerConfig {
    /// Creates a config bound to `addr` with default limits.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Sets the maximum number of concurrent connections.
    #[must_use]
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the maximum inbound packet size.
    #[must_use]
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    /// Sets the CONNECT timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the lifecycle event channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
