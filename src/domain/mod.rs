//! Domain layer: regions, occupancy counters, and the observer event system.
//!
//! This module contains the server-side domain model: the validated
//! [`Region`] identifier, the [`RegionCounterStore`], the events observers
//! receive, and the [`EventBus`] that fans them out.

pub mod counter_store;
pub mod debug_record;
pub mod event_bus;
pub mod region;
pub mod tracker_event;

pub use counter_store::{Delta, RegionCounterStore};
pub use debug_record::{DebugKind, DebugRecord};
pub use event_bus::EventBus;
pub use region::Region;
pub use tracker_event::{RegionUpdate, TrackerEvent};
