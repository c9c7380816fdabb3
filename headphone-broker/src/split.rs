//! Low-latency broker over two client sessions
//!
//! Pub/sub clients of this family cannot issue commands on a connection that
//! is in subscriber mode, so one session publishes and a second one
//! subscribes. Delivery is fire-and-forget.

use std::sync::Arc;

use async_trait::async_trait;

use crate::broker::{MessageBroker, MessageHandler};
use crate::client::{open_session, ClientConnector, PubSubClient};
use crate::config::ConnectionOptions;
use crate::error::Result;
use crate::external::{close_quietly, ExternalCore};

const BACKEND: &str = "redis";

/// Broker backed by a Redis-style client with separate publish and subscribe connections.
pub struct SplitBroker {
    connector: Arc<dyn ClientConnector>,
    core: ExternalCore,
}

impl SplitBroker {
    pub fn new(connector: Arc<dyn ClientConnector>, options: ConnectionOptions) -> Self {
        Self {
            connector,
            core: ExternalCore::new(BACKEND, options),
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        self.core.options()
    }

    pub fn subscription_count(&self) -> usize {
        self.core.registry().len()
    }
}

#[async_trait]
impl MessageBroker for SplitBroker {
    fn name(&self) -> &'static str {
        self.core.backend()
    }

    fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    async fn connect(&self) -> Result<()> {
        let mut connection = self.core.connection().lock().await;
        if connection.is_some() {
            tracing::debug!("Redis broker already connected");
            return Ok(());
        }

        let options = self.core.options();
        let publisher = open_session(BACKEND, self.connector.as_ref(), options).await?;
        let publisher: Arc<dyn PubSubClient> = Arc::from(publisher.client);

        let subscriber = match open_session(BACKEND, self.connector.as_ref(), options).await {
            Ok(session) => session,
            Err(e) => {
                close_quietly(BACKEND, publisher.as_ref()).await;
                return Err(e);
            }
        };

        self.core.attach(
            &mut connection,
            publisher,
            Arc::from(subscriber.client),
            false,
            subscriber.inbound,
        );

        tracing::info!("Connected to Redis broker at {}", options.url("redis"));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.core.disconnect().await
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.core.publish(topic, payload).await
    }

    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> Result<()> {
        self.core.subscribe(topic, handler).await
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.core.unsubscribe(topic).await
    }
}
