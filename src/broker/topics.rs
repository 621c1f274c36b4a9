//! Topic subscription registry.
//!
//! The registry is organized by topic filter: each filter maps to the set of
//! clients subscribed to it. Wildcard semantics and name/filter validation
//! come from [`mqttbytes`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Returns `true` if `topic` is a valid topic name for PUBLISH.
#[must_use]
pub fn is_valid_topic_name(topic: &str) -> bool {
    !topic.is_empty() && mqttbytes::valid_topic(topic)
}

/// Returns `true` if `filter` is a valid SUBSCRIBE topic filter.
#[must_use]
pub fn is_valid_topic_filter(filter: &str) -> bool {
    !filter.is_empty() && mqttbytes::valid_filter(filter)
}

/// Subscriptions of all connected clients.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    filters: BTreeMap<String, HashSet<String>>,
}

impl TopicRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `client_id` to `filter`.
    ///
    /// Returns `false` and leaves the registry untouched if the filter is
    /// invalid.
    pub fn subscribe(&mut self, client_id: &str, filter: &str) -> bool {
        if !is_valid_topic_filter(filter) {
            return false;
        }
        self.filters
            .entry(filter.to_string())
            .or_default()
            .insert(client_id.to_string());
        true
    }

    /// Removes the subscription of `client_id` to `filter`.
    ///
    /// Returns `true` if a subscription existed.
    pub fn unsubscribe(&mut self, client_id: &str, filter: &str) -> bool {
        let Some(subscribers) = self.filters.get_mut(filter) else {
            return false;
        };
        let removed = subscribers.remove(client_id);
        if subscribers.is_empty() {
            self.filters.remove(filter);
        }
        removed
    }

    /// Removes every subscription held by `client_id`.
    pub fn remove_client(&mut self, client_id: &str) {
        self.filters.retain(|_, subscribers| {
            subscribers.remove(client_id);
            !subscribers.is_empty()
        });
    }

    /// Returns the clients with at least one filter matching `topic`, each
    /// once.
    #[must_use]
    pub fn subscribers(&self, topic: &str) -> BTreeSet<String> {
        self.filters
            .iter()
            .filter(|(filter, _)| mqttbytes::matches(topic, filter))
            .flat_map(|(_, subscribers)| subscribers.iter().cloned())
            .collect()
    }

    /// Returns the total number of (client, filter) subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.filters.values().map(HashSet::len).sum()
    }
}
