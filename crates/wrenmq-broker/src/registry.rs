//! The topic registry: topic values and the two subscription indices.

use std::collections::{HashMap, HashSet};

use crate::{BrokerError, Endpoint};

/// Outcome of a subscribe call.
///
/// Subscribing twice is not an error, but the handler reports the
/// pre-existing state with a different response code, so the distinction
/// is kept rather than collapsed into `()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscribed {
    /// A fresh (topic, endpoint) pair was recorded.
    Inserted,
    /// The pair already existed; nothing was mutated.
    Already,
}

/// Topic values plus the bidirectional subscription indices.
///
/// The same (topic, endpoint) relation is stored twice, once per
/// direction, so that publish fan-out and per-endpoint teardown are both
/// cheap. Every method that touches the indices updates both sides before
/// returning; callers never see them disagree.
///
/// # Concurrency note
///
/// `TopicRegistry` is NOT thread-safe by itself: plain `HashMap`s, no
/// interior locking. That is intentional: inbound datagrams are handled by
/// independently scheduled tasks, and the server serializes all of them
/// through a single `tokio::sync::Mutex` around this struct (one
/// mutual-exclusion domain for the value map and both indices). Keeping
/// the type lock-free here avoids double-locking and keeps the critical
/// sections visible at the call site.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    /// Latest value per topic. Presence here is what "the topic exists"
    /// means; the value is empty until the first publish.
    values: HashMap<String, String>,

    /// topic → endpoints interested in it. Drives publish fan-out.
    topic_endpoints: HashMap<String, HashSet<Endpoint>>,

    /// endpoint → topics it subscribed to. Drives per-endpoint teardown.
    endpoint_topics: HashMap<Endpoint, HashSet<String>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a topic with an empty value.
    ///
    /// # Errors
    /// [`BrokerError::TopicExists`] if the name is taken; an explicit
    /// create colliding with an existing topic is detectably rejected,
    /// unlike the implicit create a publish performs.
    pub fn create_topic(&mut self, topic: &str) -> Result<(), BrokerError> {
        if self.values.contains_key(topic) {
            return Err(BrokerError::TopicExists(topic.to_string()));
        }
        self.values.insert(topic.to_string(), String::new());
        tracing::info!(topic, "topic created");
        Ok(())
    }

    /// Returns a topic's latest value without mutating anything.
    ///
    /// # Errors
    /// [`BrokerError::TopicNotFound`] if the topic was never created or
    /// published to.
    pub fn read_topic(&self, topic: &str) -> Result<&str, BrokerError> {
        self.values
            .get(topic)
            .map(String::as_str)
            .ok_or_else(|| BrokerError::TopicNotFound(topic.to_string()))
    }

    /// Records an endpoint's interest in a topic. Idempotent.
    ///
    /// The existence check and the insertion into both indices happen in
    /// this one call, under the caller's lock, never as two separate
    /// critical sections.
    pub fn subscribe(&mut self, topic: &str, endpoint: Endpoint) -> Subscribed {
        let inserted = self
            .topic_endpoints
            .entry(topic.to_string())
            .or_default()
            .insert(endpoint);
        self.endpoint_topics
            .entry(endpoint)
            .or_default()
            .insert(topic.to_string());

        if inserted {
            tracing::info!(topic, %endpoint, "subscription added");
            Subscribed::Inserted
        } else {
            tracing::debug!(topic, %endpoint, "already subscribed");
            Subscribed::Already
        }
    }

    /// Removes an endpoint's interest in a topic.
    ///
    /// Tolerant of redundant calls: unsubscribing a pair that does not
    /// exist mutates nothing and is not an error. Sets that become empty
    /// are removed entirely; no residue stays in either index.
    pub fn unsubscribe(&mut self, topic: &str, endpoint: &Endpoint) {
        if let Some(endpoints) = self.topic_endpoints.get_mut(topic) {
            if endpoints.remove(endpoint) {
                tracing::info!(topic, %endpoint, "subscription removed");
            }
            if endpoints.is_empty() {
                self.topic_endpoints.remove(topic);
            }
        }
        if let Some(topics) = self.endpoint_topics.get_mut(endpoint) {
            topics.remove(topic);
            if topics.is_empty() {
                self.endpoint_topics.remove(endpoint);
            }
        }
    }

    /// Stores a topic's new value and returns the endpoints to fan out to.
    ///
    /// Publishing to a topic nobody created yet creates it: the first
    /// publish is an implicit create. The returned snapshot is taken under
    /// the caller's lock; the actual sends happen outside it, each one
    /// independent of the others.
    pub fn publish(&mut self, topic: &str, value: &str) -> Vec<Endpoint> {
        self.values.insert(topic.to_string(), value.to_string());
        let subscribers: Vec<Endpoint> = self
            .topic_endpoints
            .get(topic)
            .map(|endpoints| endpoints.iter().copied().collect())
            .unwrap_or_default();
        tracing::debug!(topic, subscribers = subscribers.len(), "value published");
        subscribers
    }

    /// Deletes a topic: its value and every subscription to it.
    ///
    /// Tolerant of unknown names, matching unsubscribe's tolerance of
    /// redundant teardown.
    pub fn remove_topic(&mut self, topic: &str) {
        self.values.remove(topic);
        if let Some(endpoints) = self.topic_endpoints.remove(topic) {
            for endpoint in endpoints {
                if let Some(topics) = self.endpoint_topics.get_mut(&endpoint) {
                    topics.remove(topic);
                    if topics.is_empty() {
                        self.endpoint_topics.remove(&endpoint);
                    }
                }
            }
        }
        tracing::info!(topic, "topic removed");
    }

    /// Drops every subscription an endpoint holds, across all topics.
    ///
    /// Invoked when liveness tracking declares a client lost.
    pub fn remove_subscriptions_for(&mut self, endpoint: &Endpoint) {
        let Some(topics) = self.endpoint_topics.remove(endpoint) else {
            return;
        };
        for topic in &topics {
            if let Some(endpoints) = self.topic_endpoints.get_mut(topic) {
                endpoints.remove(endpoint);
                if endpoints.is_empty() {
                    self.topic_endpoints.remove(topic);
                }
            }
        }
        tracing::info!(%endpoint, topics = topics.len(), "subscriptions dropped");
    }

    /// Returns `true` if the (topic, endpoint) pair is subscribed.
    pub fn is_subscribed(&self, topic: &str, endpoint: &Endpoint) -> bool {
        self.topic_endpoints
            .get(topic)
            .is_some_and(|endpoints| endpoints.contains(endpoint))
    }

    /// Number of endpoints subscribed to a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topic_endpoints
            .get(topic)
            .map_or(0, HashSet::len)
    }

    /// Number of topics that currently exist (created or published to).
    pub fn topic_count(&self) -> usize {
        self.values.len()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn ep(port: u16) -> Endpoint {
        let addr: SocketAddr = format!("10.0.0.1:{port}").parse().unwrap();
        Endpoint::new(addr)
    }

    /// Checks the symmetry invariant: (T, E) ∈ topic_endpoints iff
    /// (E, T) ∈ endpoint_topics, and neither index holds an empty set.
    fn assert_indices_symmetric(registry: &TopicRegistry) {
        for (topic, endpoints) in &registry.topic_endpoints {
            assert!(!endpoints.is_empty(), "empty set left under {topic:?}");
            for endpoint in endpoints {
                assert!(
                    registry.endpoint_topics[endpoint].contains(topic),
                    "({topic:?}, {endpoint}) missing from endpoint index"
                );
            }
        }
        for (endpoint, topics) in &registry.endpoint_topics {
            assert!(!topics.is_empty(), "empty set left under {endpoint}");
            for topic in topics {
                assert!(
                    registry.topic_endpoints[topic].contains(endpoint),
                    "({topic:?}, {endpoint}) missing from topic index"
                );
            }
        }
    }

    // =====================================================================
    // create_topic()
    // =====================================================================

    #[test]
    fn test_create_topic_starts_with_empty_value() {
        let mut registry = TopicRegistry::new();
        registry.create_topic("t").expect("should create");
        assert_eq!(registry.read_topic("t").expect("should read"), "");
    }

    #[test]
    fn test_create_topic_collision_returns_topic_exists() {
        let mut registry = TopicRegistry::new();
        registry.create_topic("t").expect("first create");

        let result = registry.create_topic("t");
        assert!(
            matches!(result, Err(BrokerError::TopicExists(name)) if name == "t"),
            "second create must be rejected"
        );
    }

    // =====================================================================
    // read_topic()
    // =====================================================================

    #[test]
    fn test_read_topic_unknown_returns_not_found() {
        let registry = TopicRegistry::new();
        let result = registry.read_topic("missing");
        assert!(matches!(
            result,
            Err(BrokerError::TopicNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_read_topic_does_not_mutate() {
        let mut registry = TopicRegistry::new();
        registry.publish("t", "v");
        assert_eq!(registry.read_topic("t").unwrap(), "v");
        assert_eq!(registry.read_topic("t").unwrap(), "v");
        assert_eq!(registry.topic_count(), 1);
    }

    // =====================================================================
    // subscribe()
    // =====================================================================

    #[test]
    fn test_subscribe_inserts_into_both_indices() {
        let mut registry = TopicRegistry::new();
        assert_eq!(registry.subscribe("t", ep(1)), Subscribed::Inserted);

        assert!(registry.is_subscribed("t", &ep(1)));
        assert_indices_symmetric(&registry);
    }

    #[test]
    fn test_subscribe_twice_is_idempotent() {
        let mut registry = TopicRegistry::new();
        assert_eq!(registry.subscribe("t", ep(1)), Subscribed::Inserted);
        assert_eq!(registry.subscribe("t", ep(1)), Subscribed::Already);

        // Exactly one entry for the pair, in each direction.
        assert_eq!(registry.subscriber_count("t"), 1);
        assert_eq!(registry.endpoint_topics[&ep(1)].len(), 1);
        assert_indices_symmetric(&registry);
    }

    #[test]
    fn test_subscribe_does_not_create_the_topic_value() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("t", ep(1));
        // Interest alone gives the topic no value; reads still miss.
        assert!(registry.read_topic("t").is_err());
    }

    // =====================================================================
    // unsubscribe()
    // =====================================================================

    #[test]
    fn test_unsubscribe_removes_from_both_indices() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("t", ep(1));

        registry.unsubscribe("t", &ep(1));

        assert!(!registry.is_subscribed("t", &ep(1)));
        assert_indices_symmetric(&registry);
    }

    #[test]
    fn test_unsubscribe_never_subscribed_is_a_tolerated_noop() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("other", ep(2));

        registry.unsubscribe("t", &ep(1));

        assert_eq!(registry.subscriber_count("other"), 1);
        assert_indices_symmetric(&registry);
    }

    #[test]
    fn test_unsubscribe_last_endpoint_leaves_no_empty_set() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("t", ep(1));

        registry.unsubscribe("t", &ep(1));

        assert!(!registry.topic_endpoints.contains_key("t"));
        assert!(!registry.endpoint_topics.contains_key(&ep(1)));
    }

    #[test]
    fn test_unsubscribe_keeps_other_subscribers() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("t", ep(1));
        registry.subscribe("t", ep(2));

        registry.unsubscribe("t", &ep(1));

        assert!(!registry.is_subscribed("t", &ep(1)));
        assert!(registry.is_subscribed("t", &ep(2)));
        assert_indices_symmetric(&registry);
    }

    // =====================================================================
    // publish()
    // =====================================================================

    #[test]
    fn test_publish_then_read_returns_stored_value() {
        let mut registry = TopicRegistry::new();
        registry.publish("temp", "21.5");
        assert_eq!(registry.read_topic("temp").unwrap(), "21.5");
    }

    #[test]
    fn test_publish_creates_unknown_topic() {
        let mut registry = TopicRegistry::new();
        assert_eq!(registry.topic_count(), 0);
        registry.publish("fresh", "v");
        assert_eq!(registry.topic_count(), 1);
    }

    #[test]
    fn test_publish_overwrites_previous_value() {
        let mut registry = TopicRegistry::new();
        registry.publish("t", "old");
        registry.publish("t", "new");
        assert_eq!(registry.read_topic("t").unwrap(), "new");
    }

    #[test]
    fn test_publish_returns_exactly_the_subscribers() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("x", ep(1));
        registry.subscribe("x", ep(2));
        registry.subscribe("y", ep(3)); // not subscribed to x

        let mut fanout = registry.publish("x", "v");
        fanout.sort_by_key(|endpoint| endpoint.addr().port());

        assert_eq!(fanout, vec![ep(1), ep(2)]);
        assert_eq!(registry.read_topic("x").unwrap(), "v");
    }

    #[test]
    fn test_publish_without_subscribers_returns_empty_fanout() {
        let mut registry = TopicRegistry::new();
        assert!(registry.publish("t", "v").is_empty());
    }

    // =====================================================================
    // remove_topic()
    // =====================================================================

    #[test]
    fn test_remove_topic_drops_value_and_subscriptions() {
        let mut registry = TopicRegistry::new();
        registry.publish("t", "v");
        registry.subscribe("t", ep(1));
        registry.subscribe("t", ep(2));

        registry.remove_topic("t");

        assert!(registry.read_topic("t").is_err());
        assert_eq!(registry.subscriber_count("t"), 0);
        assert_indices_symmetric(&registry);
    }

    #[test]
    fn test_remove_topic_unknown_is_a_tolerated_noop() {
        let mut registry = TopicRegistry::new();
        registry.remove_topic("never-created");
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_remove_topic_keeps_endpoints_other_subscriptions() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("t", ep(1));
        registry.subscribe("u", ep(1));

        registry.remove_topic("t");

        assert!(registry.is_subscribed("u", &ep(1)));
        assert_indices_symmetric(&registry);
    }

    // =====================================================================
    // remove_subscriptions_for()
    // =====================================================================

    #[test]
    fn test_remove_subscriptions_for_clears_every_topic() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("a", ep(1));
        registry.subscribe("b", ep(1));
        registry.subscribe("b", ep(2));

        registry.remove_subscriptions_for(&ep(1));

        assert!(!registry.is_subscribed("a", &ep(1)));
        assert!(!registry.is_subscribed("b", &ep(1)));
        assert!(registry.is_subscribed("b", &ep(2)));
        assert_indices_symmetric(&registry);
    }

    #[test]
    fn test_remove_subscriptions_for_unknown_endpoint_is_noop() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("a", ep(1));

        registry.remove_subscriptions_for(&ep(99));

        assert!(registry.is_subscribed("a", &ep(1)));
        assert_indices_symmetric(&registry);
    }

    // =====================================================================
    // Symmetry under operation sequences
    // =====================================================================

    #[test]
    fn test_indices_stay_symmetric_through_mixed_operations() {
        let mut registry = TopicRegistry::new();
        registry.subscribe("a", ep(1));
        registry.subscribe("a", ep(2));
        registry.subscribe("b", ep(1));
        registry.unsubscribe("a", &ep(1));
        registry.subscribe("c", ep(3));
        registry.remove_topic("b");
        registry.subscribe("a", ep(1));
        registry.remove_subscriptions_for(&ep(2));
        registry.unsubscribe("c", &ep(3));

        assert_indices_symmetric(&registry);
        assert!(registry.is_subscribed("a", &ep(1)));
        assert!(!registry.is_subscribed("a", &ep(2)));
    }
}
