//! Service layer: the event hub and the broker event adapter.

pub mod broker_adapter;
pub mod event_hub;

pub use broker_adapter::BrokerEventAdapter;
pub use event_hub::EventHub;
