//! Single-slot topic → handler registry
//!
//! Every adapter keeps its subscriptions here. A topic maps to exactly one
//! handler; registering a second handler for the same topic replaces the first.
//! Handlers are always invoked outside the lock so a handler may itself
//! subscribe or unsubscribe.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::RwLock;

use crate::broker::MessageHandler;

/// Thread-safe map of topic to its single subscriber.
#[derive(Default)]
pub struct SubscriptionRegistry {
    handlers: RwLock<HashMap<String, MessageHandler>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`, returning the handler it replaced, if any.
    pub fn insert(&self, topic: &str, handler: MessageHandler) -> Option<MessageHandler> {
        let previous = self.handlers.write().insert(topic.to_string(), handler);
        if previous.is_some() {
            tracing::debug!("Replaced existing subscriber for topic {}", topic);
        }
        previous
    }

    /// Put back a handler displaced by a failed subscribe, or drop the slot if there was none.
    pub(crate) fn restore(&self, topic: &str, previous: Option<MessageHandler>) {
        let mut handlers = self.handlers.write();
        match previous {
            Some(handler) => {
                handlers.insert(topic.to_string(), handler);
            }
            None => {
                handlers.remove(topic);
            }
        }
    }

    /// Remove the handler for `topic`. Returns whether one was registered.
    pub fn remove(&self, topic: &str) -> bool {
        self.handlers.write().remove(topic).is_some()
    }

    /// Handler currently registered for `topic`.
    pub fn get(&self, topic: &str) -> Option<MessageHandler> {
        self.handlers.read().get(topic).cloned()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.handlers.read().contains_key(topic)
    }

    /// Invoke the handler registered for `topic`, if any.
    ///
    /// Returns `false` when the payload was discarded because nobody is subscribed.
    /// A panicking handler is logged and does not take the caller down with it.
    pub fn dispatch(&self, topic: &str, payload: String) -> bool {
        let Some(handler) = self.get(topic) else {
            return false;
        };

        if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
            tracing::warn!("Subscriber for topic {} panicked", topic);
        }
        true
    }

    /// Subscribed topics, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.handlers.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Drop every subscription, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut handlers = self.handlers.write();
        let count = handlers.len();
        handlers.clear();
        count
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("topics", &self.topics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::handler;
    use std::sync::{Arc, Mutex};

    fn recording() -> (MessageHandler, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (handler(move |payload| sink.lock().unwrap().push(payload)), seen)
    }

    #[test]
    fn test_dispatch_to_registered_handler() {
        let registry = SubscriptionRegistry::new();
        let (h, seen) = recording();
        assert!(registry.insert("a", h).is_none());

        assert!(registry.dispatch("a", "hello".to_string()));
        assert!(!registry.dispatch("b", "ignored".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_second_subscribe_replaces_first() {
        let registry = SubscriptionRegistry::new();
        let (first, first_seen) = recording();
        let (second, second_seen) = recording();

        registry.insert("t", first);
        assert!(registry.insert("t", second).is_some());
        registry.dispatch("t", "x".to_string());

        assert!(first_seen.lock().unwrap().is_empty());
        assert_eq!(second_seen.lock().unwrap().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_restore_puts_back_previous_handler() {
        let registry = SubscriptionRegistry::new();
        let (first, first_seen) = recording();
        let (second, _) = recording();

        registry.insert("t", first);
        let previous = registry.insert("t", second);
        registry.restore("t", previous);
        registry.dispatch("t", "x".to_string());
        assert_eq!(first_seen.lock().unwrap().len(), 1);

        let previous = registry.insert("u", recording().0);
        registry.restore("u", previous);
        assert!(!registry.contains("u"));
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = SubscriptionRegistry::new();
        registry.insert("b", recording().0);
        registry.insert("a", recording().0);
        assert_eq!(registry.topics(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let registry = SubscriptionRegistry::new();
        registry.insert("bad", handler(|_| panic!("boom")));
        assert!(registry.dispatch("bad", String::new()));
    }

    #[test]
    fn test_handler_may_reenter_registry() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let inner = Arc::clone(&registry);
        registry.insert(
            "once",
            handler(move |_| {
                inner.remove("once");
            }),
        );

        assert!(registry.dispatch("once", String::new()));
        assert!(!registry.contains("once"));
    }
}
