//! Seam to external broker client libraries
//!
//! A concrete client (MQTT, Redis, ...) is wrapped in a [`ClientConnector`]
//! that opens [`ClientSession`]s. A session is a command half
//! ([`PubSubClient`]) plus the single inbound stream on which the client
//! delivers messages for every subscribed topic.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::{ConnectionOptions, Qos};
use crate::error::{BrokerError, Result};

/// Error type reported by client libraries.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// A message received from the backend, for any topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Payload as text. Invalid UTF-8 is replaced rather than rejected; the
    /// consumer decides whether the result is meaningful.
    pub fn into_text(self) -> String {
        match String::from_utf8(self.payload) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Stream of every message the backend delivers on a session.
pub type InboundStream = mpsc::UnboundedReceiver<InboundMessage>;

/// Command half of an external client connection.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8], qos: Qos) -> std::result::Result<(), ClientError>;

    async fn subscribe(&self, topic: &str, qos: Qos) -> std::result::Result<(), ClientError>;

    async fn unsubscribe(&self, topic: &str) -> std::result::Result<(), ClientError>;

    /// Close the connection. Called once, on disconnect.
    async fn close(&self) -> std::result::Result<(), ClientError>;
}

/// An open connection to the backend.
pub struct ClientSession {
    pub client: Box<dyn PubSubClient>,
    pub inbound: InboundStream,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession").finish_non_exhaustive()
    }
}

/// Factory for sessions against one backend.
#[async_trait]
pub trait ClientConnector: Send + Sync {
    async fn connect(&self, options: &ConnectionOptions) -> std::result::Result<ClientSession, ClientError>;
}

/// Open a session, bounded by the configured connect timeout.
pub(crate) async fn open_session(
    backend: &'static str,
    connector: &dyn ClientConnector,
    options: &ConnectionOptions,
) -> Result<ClientSession> {
    options
        .validate()
        .map_err(|e| BrokerError::connection_failure(backend, e.to_string()))?;

    match tokio::time::timeout(options.connect_timeout, connector.connect(options)).await {
        Ok(Ok(session)) => Ok(session),
        Ok(Err(e)) => Err(BrokerError::connection_failure(backend, e.to_string())),
        Err(_) => Err(BrokerError::connection_failure(
            backend,
            format!("timed out after {:?}", options.connect_timeout),
        )),
    }
}
