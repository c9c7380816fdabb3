//! In-memory stand-in for an external broker, used to exercise the adapters.
//!
//! A [`MockHub`] plays the backend. Every connection it accepts becomes a
//! session; publishes are fanned out to sessions subscribed to the exact
//! topic, and [`MockHub::inject`] pushes a message to every session whether
//! it subscribed or not.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use headphone_broker::{
    ClientConnector, ClientError, ClientSession, ConnectionOptions, InboundMessage, PubSubClient,
    Qos,
};
use tokio::sync::mpsc;

struct SessionRecord {
    sender: Option<mpsc::UnboundedSender<InboundMessage>>,
    subscriptions: HashSet<String>,
}

#[derive(Default)]
struct HubState {
    sessions: Vec<SessionRecord>,
    published: Vec<(String, String, Qos)>,
    subscribe_calls: Vec<(String, Qos)>,
    unsubscribe_calls: Vec<String>,
    connect_attempts: usize,
    refuse_from_attempt: Option<usize>,
    connect_delay: Option<Duration>,
    fail_publish: bool,
    fail_subscribe: bool,
    fail_unsubscribe: bool,
    fail_close: bool,
}

/// Simulated backend shared by every session it opens.
#[derive(Clone, Default)]
pub struct MockHub {
    state: Arc<Mutex<HubState>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> Arc<dyn ClientConnector> {
        Arc::new(MockConnector { hub: self.clone() })
    }

    /// Refuse every connection attempt from the `n`th (1-based) onwards.
    pub fn refuse_connections_from(&self, n: usize) {
        self.state.lock().unwrap().refuse_from_attempt = Some(n);
    }

    pub fn refuse_connections(&self) {
        self.refuse_connections_from(1);
    }

    pub fn delay_connections(&self, delay: Duration) {
        self.state.lock().unwrap().connect_delay = Some(delay);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.state.lock().unwrap().fail_publish = fail;
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.state.lock().unwrap().fail_subscribe = fail;
    }

    pub fn fail_unsubscribe(&self, fail: bool) {
        self.state.lock().unwrap().fail_unsubscribe = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.state.lock().unwrap().fail_close = fail;
    }

    /// Deliver a message to every open session, ignoring subscriptions.
    pub fn inject(&self, topic: &str, payload: &str) {
        let state = self.state.lock().unwrap();
        for session in &state.sessions {
            if let Some(sender) = &session.sender {
                let _ = sender.send(InboundMessage::new(topic, payload.as_bytes().to_vec()));
            }
        }
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.lock().unwrap().connect_attempts
    }

    /// Sessions accepted so far, open or closed.
    pub fn sessions(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    pub fn open_sessions(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.sender.is_some())
            .count()
    }

    pub fn published(&self) -> Vec<(String, String, Qos)> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn subscribe_calls(&self) -> Vec<(String, Qos)> {
        self.state.lock().unwrap().subscribe_calls.clone()
    }

    pub fn unsubscribe_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().unsubscribe_calls.clone()
    }

    /// Topics session `index` is subscribed to on the backend.
    pub fn session_subscriptions(&self, index: usize) -> HashSet<String> {
        self.state.lock().unwrap().sessions[index].subscriptions.clone()
    }
}

struct MockConnector {
    hub: MockHub,
}

#[async_trait]
impl ClientConnector for MockConnector {
    async fn connect(&self, _options: &ConnectionOptions) -> Result<ClientSession, ClientError> {
        let delay = {
            let mut state = self.hub.state.lock().unwrap();
            state.connect_attempts += 1;
            state.connect_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.hub.state.lock().unwrap();
        if let Some(n) = state.refuse_from_attempt {
            if state.connect_attempts >= n {
                return Err("connection refused".into());
            }
        }

        let (sender, inbound) = mpsc::unbounded_channel();
        state.sessions.push(SessionRecord {
            sender: Some(sender),
            subscriptions: HashSet::new(),
        });
        let index = state.sessions.len() - 1;

        Ok(ClientSession {
            client: Box::new(MockClient {
                hub: self.hub.clone(),
                index,
            }),
            inbound,
        })
    }
}

struct MockClient {
    hub: MockHub,
    index: usize,
}

#[async_trait]
impl PubSubClient for MockClient {
    async fn publish(&self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), ClientError> {
        let mut state = self.hub.state.lock().unwrap();
        if state.fail_publish {
            return Err("publish rejected".into());
        }

        let text = String::from_utf8_lossy(payload).into_owned();
        state.published.push((topic.to_string(), text, qos));
        for session in &state.sessions {
            if !session.subscriptions.contains(topic) {
                continue;
            }
            if let Some(sender) = &session.sender {
                let _ = sender.send(InboundMessage::new(topic, payload.to_vec()));
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, qos: Qos) -> Result<(), ClientError> {
        let mut state = self.hub.state.lock().unwrap();
        if state.fail_subscribe {
            return Err("subscribe rejected".into());
        }
        state.subscribe_calls.push((topic.to_string(), qos));
        state.sessions[self.index]
            .subscriptions
            .insert(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        let mut state = self.hub.state.lock().unwrap();
        if state.fail_unsubscribe {
            return Err("unsubscribe rejected".into());
        }
        state.unsubscribe_calls.push(topic.to_string());
        state.sessions[self.index].subscriptions.remove(topic);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        let mut state = self.hub.state.lock().unwrap();
        let session = &mut state.sessions[self.index];
        session.sender = None;
        session.subscriptions.clear();
        if state.fail_close {
            return Err("close failed".into());
        }
        Ok(())
    }
}

/// Handler that forwards payloads to a channel.
pub fn channel_handler() -> (
    headphone_broker::MessageHandler,
    mpsc::UnboundedReceiver<String>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = headphone_broker::handler(move |payload| {
        let _ = tx.send(payload);
    });
    (handler, rx)
}

/// Next payload, or `None` if nothing arrives within a second.
pub async fn recv(rx: &mut mpsc::UnboundedReceiver<String>) -> Option<String> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Assert nothing arrives for a short while. A closed channel counts as
/// silent: dropping the handler drops its sender.
pub async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<String>) {
    let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(!matches!(result, Ok(Some(_))), "unexpected delivery: {:?}", result);
}
