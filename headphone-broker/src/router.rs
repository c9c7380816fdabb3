//! Inbound message routing for external adapters.
//!
//! Client libraries deliver every topic through one stream; the router filters
//! each message by exact topic match against the registry before handing it to
//! the subscriber.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::client::InboundStream;
use crate::registry::SubscriptionRegistry;

pub(crate) fn spawn_router(
    backend: &'static str,
    mut inbound: InboundStream,
    registry: Arc<SubscriptionRegistry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Started {} inbound router", backend);

        while let Some(message) = inbound.recv().await {
            let topic = message.topic.clone();
            if !registry.dispatch(&topic, message.into_text()) {
                tracing::trace!("{} message on {} has no subscriber, dropped", backend, topic);
            }
        }

        tracing::info!("{} inbound stream closed", backend);
    })
}
