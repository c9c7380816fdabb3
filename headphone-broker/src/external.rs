//! Connection state shared by the external adapters
//!
//! Both external families keep a publisher and a subscriber client. The
//! at-least-once adapter uses one session for both; the low-latency adapter
//! opens two. Everything after `connect` is identical and lives here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::broker::MessageHandler;
use crate::client::{InboundStream, PubSubClient};
use crate::config::ConnectionOptions;
use crate::error::{BrokerError, Operation, Result};
use crate::registry::SubscriptionRegistry;
use crate::router::spawn_router;

/// An established connection to an external backend
pub(crate) struct Connection {
    publisher: Arc<dyn PubSubClient>,
    subscriber: Arc<dyn PubSubClient>,
    /// Publisher and subscriber are the same client
    shared: bool,
    router: JoinHandle<()>,
}

pub(crate) struct ExternalCore {
    backend: &'static str,
    options: ConnectionOptions,
    registry: Arc<SubscriptionRegistry>,
    connection: Mutex<Option<Connection>>,
    connected: AtomicBool,
}

impl ExternalCore {
    pub(crate) fn new(backend: &'static str, options: ConnectionOptions) -> Self {
        Self {
            backend,
            options,
            registry: Arc::new(SubscriptionRegistry::new()),
            connection: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub(crate) fn backend(&self) -> &'static str {
        self.backend
    }

    pub(crate) fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub(crate) fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn connection(&self) -> &Mutex<Option<Connection>> {
        &self.connection
    }

    /// Install a freshly opened connection and start routing its inbound stream.
    pub(crate) fn attach(
        &self,
        slot: &mut Option<Connection>,
        publisher: Arc<dyn PubSubClient>,
        subscriber: Arc<dyn PubSubClient>,
        shared: bool,
        inbound: InboundStream,
    ) {
        let router = spawn_router(self.backend, inbound, Arc::clone(&self.registry));
        *slot = Some(Connection {
            publisher,
            subscriber,
            shared,
            router,
        });
        self.connected.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn disconnect(&self) -> Result<()> {
        let Some(connection) = self.connection.lock().await.take() else {
            tracing::debug!("{} broker already disconnected", self.backend);
            return Ok(());
        };

        self.connected.store(false, Ordering::SeqCst);
        connection.router.abort();
        let cleared = self.registry.clear();

        close_quietly(self.backend, connection.subscriber.as_ref()).await;
        if !connection.shared {
            close_quietly(self.backend, connection.publisher.as_ref()).await;
        }

        tracing::info!(
            "Disconnected from {} broker ({} subscriptions cleared)",
            self.backend,
            cleared
        );
        Ok(())
    }

    async fn publisher(&self) -> Result<Arc<dyn PubSubClient>> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|connection| Arc::clone(&connection.publisher))
            .ok_or_else(|| BrokerError::not_connected(self.backend))
    }

    async fn subscriber(&self) -> Result<Arc<dyn PubSubClient>> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|connection| Arc::clone(&connection.subscriber))
            .ok_or_else(|| BrokerError::not_connected(self.backend))
    }

    pub(crate) async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let client = self.publisher().await?;
        client
            .publish(topic, payload.as_bytes(), self.options.publish_qos)
            .await
            .map_err(|e| BrokerError::backend(self.backend, Operation::Publish, e))
    }

    /// Register the handler first so nothing the backend sends right after
    /// acknowledging the subscription is lost; roll back if the backend refuses.
    pub(crate) async fn subscribe(&self, topic: &str, handler: MessageHandler) -> Result<()> {
        let client = self.subscriber().await?;
        let previous = self.registry.insert(topic, handler);

        if let Err(e) = client.subscribe(topic, self.options.subscribe_qos).await {
            self.registry.restore(topic, previous);
            return Err(BrokerError::backend(self.backend, Operation::Subscribe, e));
        }

        if !self.is_connected() {
            // disconnected while the subscribe was in flight
            self.registry.remove(topic);
            return Err(BrokerError::not_connected(self.backend));
        }

        tracing::debug!("Subscribed to {} on {} broker", topic, self.backend);
        Ok(())
    }

    pub(crate) async fn unsubscribe(&self, topic: &str) -> Result<()> {
        let client = self.subscriber().await?;
        if !self.registry.remove(topic) {
            tracing::debug!("{} is not subscribed on {} broker", topic, self.backend);
            return Ok(());
        }

        client
            .unsubscribe(topic)
            .await
            .map_err(|e| BrokerError::backend(self.backend, Operation::Unsubscribe, e))?;

        tracing::debug!("Unsubscribed from {} on {} broker", topic, self.backend);
        Ok(())
    }
}

/// Close a client, logging instead of failing; closing is best-effort.
pub(crate) async fn close_quietly(backend: &'static str, client: &dyn PubSubClient) {
    if let Err(e) = client.close().await {
        tracing::warn!("Error closing {} connection: {}", backend, e);
    }
}
