//! Normalized broker log lines pushed to observers on the `debug` channel.

use serde::{Deserialize, Serialize};

/// Category of a [`DebugRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebugKind {
    /// Client connected or disconnected.
    Client,
    /// Client published a message.
    Publish,
    /// Client subscribed or unsubscribed.
    Subscribe,
}

/// A single debug line derived from a broker lifecycle event.
///
/// Serialized as `{"type": "CLIENT", "msg": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugRecord {
    /// Record category.
    #[serde(rename = "type")]
    pub kind: DebugKind,
    /// Human-readable message.
    pub msg: String,
}

impl DebugRecord {
    /// Creates a record of the given kind.
    #[must_use]
    pub fn new(kind: DebugKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
        }
    }
}
