//! The publish/subscribe contract every backend satisfies.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Callback invoked with each payload delivered on a subscribed topic.
///
/// Handlers run on the backend's delivery task and must not block.
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Wrap a closure as a [`MessageHandler`].
pub fn handler<F>(f: F) -> MessageHandler
where
    F: Fn(String) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Uniform pub/sub contract.
///
/// All operations except `connect` and `disconnect` fail with
/// [`BrokerError::NotConnected`](crate::BrokerError::NotConnected) until
/// `connect` has succeeded. Each topic has at most one handler: subscribing
/// again replaces the previous one.
///
/// Delivery is asynchronous. Payloads published while nothing is subscribed
/// may or may not be retained, depending on the backend; each adapter
/// documents what it does.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether `connect` has succeeded and `disconnect` has not been called since.
    fn is_connected(&self) -> bool;

    /// Establish backend connectivity.
    ///
    /// Fails with `ConnectionFailure` when the backend is unreachable or
    /// misconfigured, leaving the broker disconnected. Connecting an already
    /// connected broker is a no-op.
    async fn connect(&self) -> Result<()>;

    /// Release backend resources and forget every subscription.
    ///
    /// A no-op when already disconnected.
    async fn disconnect(&self) -> Result<()>;

    /// Hand `payload` to the backend for delivery to the subscriber of `topic`.
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;

    /// Register `handler` as the single subscriber of `topic`, replacing any previous one.
    async fn subscribe(&self, topic: &str, handler: MessageHandler) -> Result<()>;

    /// Remove the subscriber of `topic`. Unknown topics are not an error.
    async fn unsubscribe(&self, topic: &str) -> Result<()>;
}
