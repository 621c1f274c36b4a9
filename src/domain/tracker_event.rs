//! Events fanned out to websocket observers.
//!
//! Every region mutation and every normalized broker event becomes a
//! [`TrackerEvent`] published through the [`super::EventBus`].

use serde::Serialize;

use super::{DebugRecord, Region};

/// Payload of the `entered-region` and `leave-region` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionUpdate {
    /// Region whose counter changed.
    pub region: Region,
    /// Counter value after the change.
    pub count: i64,
}

/// Named event delivered to every connected observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// A counter was incremented through `POST /enter/{id}`.
    EnteredRegion(RegionUpdate),
    /// A counter was decremented through `POST /leave/{id}`.
    LeaveRegion(RegionUpdate),
    /// A broker lifecycle event.
    Debug(DebugRecord),
}

impl TrackerEvent {
    /// Returns the channel name observers see for this event.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::EnteredRegion(_) => "entered-region",
            Self::LeaveRegion(_) => "leave-region",
            Self::Debug(_) => "debug",
        }
    }

    /// Serializes the event payload (without the name).
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            Self::EnteredRegion(update) | Self::LeaveRegion(update) => {
                serde_json::to_value(update)
            }
            Self::Debug(record) => serde_json::to_value(record),
        };
        value.unwrap_or_default()
    }

    /// Returns the region update carried by this event, if any.
    #[must_use]
    pub const fn region_update(&self) -> Option<&RegionUpdate> {
        match self {
            Self::EnteredRegion(update) | Self::LeaveRegion(update) => Some(update),
            Self::Debug(_) => None,
        }
    }
}
