//! At-least-once broker over a single client session
//!
//! Publishes with the configured publish QoS (at-most-once by default) and
//! subscribes with the subscribe QoS (at-least-once by default). One session
//! carries both directions; inbound messages are routed by exact topic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::broker::{MessageBroker, MessageHandler};
use crate::client::{open_session, ClientConnector, PubSubClient};
use crate::config::ConnectionOptions;
use crate::error::Result;
use crate::external::ExternalCore;

const BACKEND: &str = "mqtt";

/// Broker backed by an MQTT-style client.
pub struct ReliableBroker {
    connector: Arc<dyn ClientConnector>,
    core: ExternalCore,
}

impl ReliableBroker {
    pub fn new(connector: Arc<dyn ClientConnector>, options: ConnectionOptions) -> Self {
        Self {
            connector,
            core: ExternalCore::new(BACKEND, options),
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        self.core.options()
    }

    /// Number of topics with a registered subscriber.
    pub fn subscription_count(&self) -> usize {
        self.core.registry().len()
    }
}

#[async_trait]
impl MessageBroker for ReliableBroker {
    fn name(&self) -> &'static str {
        self.core.backend()
    }

    fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    async fn connect(&self) -> Result<()> {
        let mut connection = self.core.connection().lock().await;
        if connection.is_some() {
            tracing::debug!("MQTT broker already connected");
            return Ok(());
        }

        let options = self.core.options();
        let session = open_session(BACKEND, self.connector.as_ref(), options).await?;
        let client: Arc<dyn PubSubClient> = Arc::from(session.client);

        self.core.attach(
            &mut connection,
            Arc::clone(&client),
            client,
            true,
            session.inbound,
        );

        tracing::info!("Connected to MQTT broker at {}", options.url("mqtt"));
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
