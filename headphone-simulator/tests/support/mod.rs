//! Recording broker for exercising the generator without a backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use headphone_broker::{BrokerError, MessageBroker, MessageHandler, Result};
use headphone_model::HeadphoneEvent;

/// Broker that records every publish and optionally rejects them all.
#[derive(Default)]
pub struct RecordingBroker {
    published: Mutex<Vec<(String, String)>>,
    attempts: Mutex<usize>,
    reject: AtomicBool,
}

impl RecordingBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        let broker = Self::default();
        broker.reject.store(true, Ordering::SeqCst);
        Arc::new(broker)
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Decoded events published to `topic`, in order.
    pub fn events_on(&self, topic: &str) -> Vec<HeadphoneEvent> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| HeadphoneEvent::from_payload(&payload).unwrap())
            .collect()
    }
}

#[async_trait]
impl MessageBroker for RecordingBroker {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.reject.load(Ordering::SeqCst) {
            return Err(BrokerError::NotConnected {
                backend: "recording",
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    async fn subscribe(&self, _topic: &str, _handler: MessageHandler) -> Result<()> {
        Ok(())
    }

    async fn unsubscribe(&self, _topic: &str) -> Result<()> {
        Ok(())
    }
}
