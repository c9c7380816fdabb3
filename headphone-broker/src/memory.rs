//! In-process broker
//!
//! Delivery semantics:
//! - A publish with no subscriber registered at publish time is discarded.
//! - Accepted payloads are queued and handed to the subscriber from a single
//!   dispatch task, so delivery never runs inside `publish` and publish order is
//!   preserved.
//! - The subscriber is looked up again at delivery time; a topic unsubscribed
//!   in between loses the payload.
//! - No retries, no retention. `disconnect` drops whatever is still queued.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broker::{MessageBroker, MessageHandler};
use crate::error::{BrokerError, Result};
use crate::registry::SubscriptionRegistry;

const BACKEND: &str = "memory";

/// A payload waiting to be handed to its subscriber
#[derive(Debug)]
struct Delivery {
    topic: String,
    payload: String,
}

/// Live connection state: the dispatch queue and the task draining it
struct Dispatcher {
    sender: mpsc::UnboundedSender<Delivery>,
    task: JoinHandle<()>,
}

/// Broker that delivers within the current process.
///
/// Requires a tokio runtime at `connect` time.
pub struct MemoryBroker {
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Mutex<Option<Dispatcher>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SubscriptionRegistry::new()),
            dispatcher: Mutex::new(None),
        }
    }

    /// Number of topics with a registered subscriber.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    fn sender(&self) -> Result<mpsc::UnboundedSender<Delivery>> {
        self.dispatcher
            .lock()
            .as_ref()
            .map(|dispatcher| dispatcher.sender.clone())
            .ok_or_else(|| BrokerError::not_connected(BACKEND))
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.dispatcher.lock().is_some() {
            Ok(())
        } else {
            Err(BrokerError::not_connected(BACKEND))
        }
    }

    async fn dispatch_loop(
        registry: Arc<SubscriptionRegistry>,
        mut receiver: mpsc::UnboundedReceiver<Delivery>,
    ) {
        while let Some(delivery) = receiver.recv().await {
            if !registry.dispatch(&delivery.topic, delivery.payload) {
                tracing::trace!("Discarding message for unsubscribed topic {}", delivery.topic);
            }
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBroker for MemoryBroker {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn is_connected(&self) -> bool {
        self.dispatcher.lock().is_some()
    }

    async fn connect(&self) -> Result<()> {
        let mut dispatcher = self.dispatcher.lock();
        if dispatcher.is_some() {
            tracing::debug!("In-memory broker already connected");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| BrokerError::connection_failure(BACKEND, e.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let task = runtime.spawn(Self::dispatch_loop(Arc::clone(&self.registry), receiver));
        *dispatcher = Some(Dispatcher { sender, task });

        tracing::info!("Connected to in-memory broker");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(dispatcher) = self.dispatcher.lock().take() else {
            tracing::debug!("In-memory broker already disconnected");
            return Ok(());
        };

        dispatcher.task.abort();
        let dropped = self.registry.clear();

        tracing::info!(
            "Disconnected from in-memory broker ({} subscriptions cleared)",
            dropped
        );
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let sender = self.sender()?;

        if !self.registry.contains(topic) {
            tracing::trace!("No subscriber for topic {}, message dropped", topic);
            return Ok(());
        }

        sender
            .send(Delivery {
                topic: topic.to_string(),
                payload: payload.to_string(),
            })
            .map_err(|_| BrokerError::not_connected(BACKEND))
    }

    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> Result<()> {
        self.ensure_connected()?;
        self.registry.insert(topic, handler);
        tracing::debug!("Subscribed to {}", topic);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.ensure_connected()?;
        if self.registry.remove(topic) {
            tracing::debug!("Unsubscribed from {}", topic);
        }
        Ok(())
    }
}
