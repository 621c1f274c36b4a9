//! Event hub: region mutations, broker events, and observer fan-out.

use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::BrokerEventAdapter;
use crate::broker::{BrokerEvent, BrokerHandle};
use crate::domain::{
    DebugRecord, Delta, EventBus, Region, RegionCounterStore, RegionUpdate, TrackerEvent,
};
use crate::error::TrackerError;

/// Composition point between the HTTP API, the broker, and observers.
///
/// Owns the only [`RegionCounterStore`]. A region mutation and its broadcast
/// happen under the same lock, so observers see region updates in exactly
/// the order the counters changed.
#[derive(Debug)]
pub struct EventHub {
    store: Mutex<RegionCounterStore>,
    event_bus: EventBus,
    broker: BrokerHandle,
    publish_count: AtomicU64,
}

impl EventHub {
    /// Creates a hub with all counters at zero.
    #[must_use]
    pub fn new(event_bus: EventBus, broker: BrokerHandle) -> Self {
        Self {
            store: Mutex::new(RegionCounterStore::new()),
            event_bus,
            broker,
            publish_count: AtomicU64::new(0),
        }
    }

    /// Returns the observer event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the broker handle owned by the hub.
    #[must_use]
    pub fn broker(&self) -> &BrokerHandle {
        &self.broker
    }

    /// Increments the counter of the region identified by `raw` and
    /// broadcasts `entered-region` to every observer.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidRegion`] if `raw` is not an integer in
    /// `1..=4`; nothing is mutated or broadcast in that case.
    pub fn enter_region(&self, raw: &str) -> Result<RegionUpdate, TrackerError> {
        self.apply(raw, Delta::Enter)
    }

    /// Decrements the counter of the region identified by `raw` and
    /// broadcasts `leave-region` to every observer.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidRegion`] if `raw` is not an integer in
    /// `1..=4`; nothing is mutated or broadcast in that case.
    pub fn leave_region(&self, raw: &str) -> Result<RegionUpdate, TrackerError> {
        self.apply(raw, Delta::Leave)
    }

    fn apply(&self, raw: &str, delta: Delta) -> Result<RegionUpdate, TrackerError> {
        let region = Region::parse(raw)?;

        let mut store = self.lock_store()?;
        let count = store.adjust(region, delta);
        let update = RegionUpdate { region, count };
        let event = match delta {
            Delta::Enter => TrackerEvent::EnteredRegion(update),
            Delta::Leave => TrackerEvent::LeaveRegion(update),
        };
        let event_name = event.event_name();
        let observers = self.event_bus.publish(event);
        let counters = store.snapshot();
        drop(store);

        tracing::info!(
            %region,
            count,
            observers,
            ?counters,
            event = event_name,
            "region counter updated"
        );
        Ok(update)
    }

    /// Handles one broker lifecycle event.
    ///
    /// Client publishes bump the publish counter. Events that normalize to a
    /// [`DebugRecord`] are broadcast once on the `debug` channel; the record
    /// is returned.
    pub fn on_broker_event(&self, event: &BrokerEvent) -> Option<DebugRecord> {
        if matches!(event, BrokerEvent::Published { client: Some(_), .. }) {
            self.publish_count.fetch_add(1, Ordering::Relaxed);
        }

        let record = BrokerEventAdapter::normalize(event)?;
        let observers = self
            .event_bus
            .publish(TrackerEvent::Debug(record.clone()));
        tracing::debug!(kind = ?record.kind, msg = %record.msg, observers, "broker event forwarded");
        Some(record)
    }

    /// Starts the single broker-event listener.
    ///
    /// The receiver is created before this returns, so no event emitted after
    /// the call is missed. Events are handled strictly in emission order.
    #[must_use]
    pub fn spawn_broker_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let hub = Arc::clone(self);
        let mut events = self.broker.events();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        hub.on_broker_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "broker event listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("broker event listener stopped");
        })
    }

    /// Returns a copy of the four region counters.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Internal`] if the counter lock is poisoned.
    pub fn counters(&self) -> Result<[i64; Region::COUNT], TrackerError> {
        Ok(self.lock_store()?.snapshot())
    }

    /// Returns how many client publishes the broker has accepted.
    #[must_use]
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    /// Publishes a message into the broker on behalf of the process.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Broker`] if the broker is shut down or the
    /// topic is invalid.
    pub async fn publish_to_broker(
        &self,
        topic: &str,
        payload: impl Into<Bytes>,
    ) -> Result<usize, TrackerError> {
        Ok(self.broker.publish(topic, payload).await?)
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, RegionCounterStore>, TrackerError> {
        self.store
            .lock()
            .map_err(|_| TrackerError::Internal("region counter lock poisoned".to_string()))
    }
}
