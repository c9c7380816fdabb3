//! Stereo dashboard aggregator
//!
//! Subscribes to every device topic, folds incoming events into per-device
//! [`StereoState`] and publishes a [`DashboardSnapshot`] on a fixed render tick.
//!
//! The state map is owned here; callers only ever see copies through
//! [`StereoDashboard::snapshot`], [`StereoDashboard::stereo`] or the
//! [`StereoDashboard::renders`] watch channel.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use headphone_broker::{handler, MessageBroker, MessageHandler};
use headphone_model::{now_millis, DeviceId, HeadphoneEvent, StereoState};
use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::snapshot::DashboardSnapshot;

type StereoMap = BTreeMap<DeviceId, StereoState>;

/// Message counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    /// Events folded into a device state
    pub applied: u64,
    /// Payloads that failed to decode
    pub malformed: u64,
    /// Well-formed events for devices that are not tracked
    pub ignored: u64,
    /// Render ticks completed
    pub renders: u64,
}

#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    malformed: AtomicU64,
    ignored: AtomicU64,
    renders: AtomicU64,
}

/// Resources held while the dashboard runs
struct Running {
    topics: Vec<String>,
    ticker: JoinHandle<()>,
}

/// Aggregates headphone events into a live view of every stereo.
pub struct StereoDashboard {
    broker: Arc<dyn MessageBroker>,
    config: DashboardConfig,
    stereos: Arc<RwLock<StereoMap>>,
    counters: Arc<Counters>,
    renders: Arc<watch::Sender<DashboardSnapshot>>,
    running: Mutex<Option<Running>>,
    is_running: AtomicBool,
}

impl StereoDashboard {
    /// Create a stopped dashboard reading from `broker`.
    ///
    /// The broker is expected to be connected by the caller before `start`.
    pub fn new(broker: Arc<dyn MessageBroker>, config: DashboardConfig) -> Result<Self> {
        config.validate()?;

        let stereos = Arc::new(RwLock::new(initial_states(config.device_count)));
        let (renders, _) = watch::channel(snapshot_of(&stereos));

        Ok(Self {
            broker,
            config,
            stereos,
            counters: Arc::new(Counters::default()),
            renders: Arc::new(renders),
            running: Mutex::new(None),
            is_running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Reset every device to its default state, subscribe to each device topic
    /// and begin the render tick. A no-op while already running.
    ///
    /// If any subscription fails, those already made are undone and the error
    /// is returned; the dashboard stays stopped.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("Dashboard already running");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DashboardError::Runtime(e.to_string()))?;

        *self.stereos.write() = initial_states(self.config.device_count);

        let mut topics = Vec::with_capacity(self.config.device_count as usize);
        for device in DeviceId::range(self.config.device_count) {
            let topic = device.topic();
            if let Err(e) = self.broker.subscribe(&topic, self.event_handler()).await {
                tracing::warn!("Failed to subscribe to {}: {}", topic, e);
                self.unsubscribe_all(&topics).await;
                return Err(e.into());
            }
            topics.push(topic);
        }

        let ticker = runtime.spawn(Self::render_loop(
            Arc::clone(&self.stereos),
            Arc::clone(&self.renders),
            Arc::clone(&self.counters),
            self.config.render_interval,
        ));

        tracing::info!(
            "Dashboard started: {} devices on {} broker",
            topics.len(),
            self.broker.name()
        );
        *running = Some(Running { topics, ticker });
        self.is_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Unsubscribe every device topic and cancel the render tick. Idempotent.
    ///
    /// Every topic is attempted even if some fail; the first failure is
    /// returned once the dashboard has fully stopped. A concurrent `start`
    /// waits until the unsubscribes are done.
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        let Some(Running { topics, ticker }) = running.take() else {
            tracing::debug!("Dashboard already stopped");
            return Ok(());
        };
        self.is_running.store(false, Ordering::SeqCst);

        ticker.abort();
        let _ = ticker.await;

        let mut first_error = None;
        for topic in &topics {
            if let Err(e) = self.broker.unsubscribe(topic).await {
                tracing::warn!("Failed to unsubscribe from {}: {}", topic, e);
                first_error.get_or_insert(e);
            }
        }

        tracing::info!("Dashboard stopped");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Copy of the current state of every device.
    pub fn snapshot(&self) -> DashboardSnapshot {
        snapshot_of(&self.stereos)
    }

    /// Current state of one device, if tracked.
    pub fn stereo(&self, device: DeviceId) -> Option<StereoState> {
        self.stereos.read().get(&device).copied()
    }

    /// Receiver updated with a fresh snapshot on every render tick.
    pub fn renders(&self) -> watch::Receiver<DashboardSnapshot> {
        self.renders.subscribe()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            applied: self.counters.applied.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            renders: self.counters.renders.load(Ordering::Relaxed),
        }
    }

    fn event_handler(&self) -> MessageHandler {
        let stereos = Arc::clone(&self.stereos);
        let counters = Arc::clone(&self.counters);
        handler(move |payload| apply_payload(&stereos, &counters, &payload))
    }

    async fn unsubscribe_all(&self, topics: &[String]) {
        for topic in topics {
            if let Err(e) = self.broker.unsubscribe(topic).await {
                tracing::warn!("Failed to roll back subscription to {}: {}", topic, e);
            }
        }
    }

    async fn render_loop(
        stereos: Arc<RwLock<StereoMap>>,
        renders: Arc<watch::Sender<DashboardSnapshot>>,
        counters: Arc<Counters>,
        period: std::time::Duration,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            renders.send_replace(snapshot_of(&stereos));
            counters.renders.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for StereoDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StereoDashboard")
            .field("broker", &self.broker.name())
            .field("config", &self.config)
            .field("is_running", &self.is_running())
            .finish()
    }
}

fn initial_states(device_count: u32) -> StereoMap {
    let now = now_millis();
    DeviceId::range(device_count)
        .map(|device| (device, StereoState::new(device, now)))
        .collect()
}

fn snapshot_of(stereos: &RwLock<StereoMap>) -> DashboardSnapshot {
    DashboardSnapshot {
        taken_at: now_millis(),
        stereos: stereos.read().values().copied().collect(),
    }
}

/// Decode one payload and fold it into the state of the device it names.
fn apply_payload(stereos: &RwLock<StereoMap>, counters: &Counters, payload: &str) {
    let event = match HeadphoneEvent::from_payload(payload) {
        Ok(event) => event,
        Err(e) => {
            counters.malformed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Failed to parse headphone event: {}", e);
            return;
        }
    };

    let mut stereos = stereos.write();
    match stereos.get_mut(&event.device_id) {
        Some(stereo) => {
            stereo.apply(&event);
            counters.applied.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                "Device {} {}: volume {}, {}",
                event.device_id,
                event.kind,
                stereo.volume,
                stereo.status
            );
        }
        None => {
            counters.ignored.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Ignoring event for unknown device {}", event.device_id);
        }
    }
}
