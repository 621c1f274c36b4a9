//! Broker error type.

/// Errors raised by the embedded broker.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Socket level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed, oversized, or unsupported frame.
    #[error("codec error: {0:?}")]
    Codec(mqttbytes::Error),

    /// The client violated the protocol flow (e.g. PUBLISH before CONNECT).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The client did not send CONNECT in time.
    #[error("client did not send CONNECT within {0} seconds")]
    ConnectTimeout(u64),

    /// The client stayed silent for longer than its keep-alive allows.
    #[error("keep-alive of {0} seconds expired")]
    KeepAliveExpired(u16),

    /// A topic name or filter failed validation.
    #[error("invalid topic: {0:?}")]
    InvalidTopic(String),

    /// The broker has been shut down.
    #[error("broker is shut down")]
    Closed,
}

impl BrokerError {
    /// Returns `true` if a CONNECT named a protocol this broker does not
    /// speak, which is answered with CONNACK return code 1.
    #[must_use]
    pub const fn is_unsupported_protocol(&self) -> bool {
        matches!(
            self,
            Self::Codec(mqttbytes::Error::InvalidProtocol | mqttbytes::Error::InvalidProtocolLevel(_))
        )
    }
}
