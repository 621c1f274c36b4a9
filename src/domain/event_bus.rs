//! Fan-out of tracker events to websocket observers.
//!
//! Region updates and normalized broker records enter here once; every
//! observer connected at that moment sees them in the same order. Observers
//! that joined later only see what is published after they joined.

use tokio::sync::broadcast;

use super::TrackerEvent;

/// Observer fan-out for [`TrackerEvent`]s.
///
/// An observer that falls more than `capacity` events behind skips the
/// oldest ones and is told how many it missed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
    /// Creates a bus that buffers up to `capacity` events per observer
    /// (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Hands `event` to every connected observer and returns how many there
    /// were. With no observer connected the event is gone.
    pub fn publish(&self, event: TrackerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Registers a new observer.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }

    /// Number of observers currently connected.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{DebugKind, DebugRecord};

    fn make_event(msg: &str) -> TrackerEvent {
        TrackerEvent::Debug(DebugRecord::new(DebugKind::Client, msg))
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_event("nobody")), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(make_event("hello")), 2);

        let Ok(e1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(e2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        for msg in ["a", "b", "c"] {
            bus.publish(make_event(msg));
        }
        for expected in ["a", "b", "c"] {
            let Ok(TrackerEvent::Debug(record)) = rx.recv().await else {
                panic!("expected debug event");
            };
            assert_eq!(record.msg, expected);
        }
    }

    #[tokio::test]
    async fn late_observer_misses_earlier_events() {
        let bus = EventBus::new(16);
        let _early = bus.subscribe();
        bus.publish(make_event("before"));

        let mut late = bus.subscribe();
        bus.publish(make_event("after"));
        let Ok(TrackerEvent::Debug(record)) = late.recv().await else {
            panic!("expected debug event");
        };
        assert_eq!(record.msg, "after");
    }

    #[tokio::test]
    async fn slow_observer_is_told_how_many_it_missed() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for msg in ["a", "b", "c"] {
            bus.publish(make_event(msg));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        let Ok(TrackerEvent::Debug(record)) = rx.recv().await else {
            panic!("expected debug event");
        };
        assert_eq!(record.msg, "b");
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
