//! Randomized event schedule for a fleet of simulated headphones
//!
//! Every device runs its own task: after an initial jitter it publishes a
//! random control event to `headphone/{id}`, then sleeps a random interval
//! and repeats. A failed publish is counted and logged; the schedule carries on.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use headphone_broker::MessageBroker;
use headphone_model::{DeviceId, HeadphoneEvent, HeadphoneEventKind};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;

use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, Result};

/// Publish counters across all devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    /// Events the broker accepted
    pub published: u64,
    /// Events the broker rejected or that could not be encoded
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    failed: AtomicU64,
}

/// Timing shared by every device schedule
#[derive(Debug, Clone)]
struct Schedule {
    initial_jitter: Duration,
    interval: Range<Duration>,
}

/// A running device schedule
#[derive(Debug)]
struct DeviceTask {
    device: DeviceId,
    handle: JoinHandle<()>,
}

/// Drives the simulated fleet.
pub struct EventGenerator {
    broker: Arc<dyn MessageBroker>,
    config: GeneratorConfig,
    counters: Arc<Counters>,
    tasks: Mutex<Vec<DeviceTask>>,
}

impl EventGenerator {
    /// Create a stopped generator publishing through `broker`.
    ///
    /// The broker is expected to be connected by the caller before `start`.
    pub fn new(broker: Arc<dyn MessageBroker>, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            broker,
            config,
            counters: Arc::new(Counters::default()),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Launch one schedule per device. A no-op while already running.
    pub async fn start(&self) -> Result<()> {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            tracing::debug!("Event generator already running");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| GeneratorError::Runtime(e.to_string()))?;

        let schedule = Schedule {
            initial_jitter: self.config.initial_jitter,
            interval: self.config.min_interval..self.config.max_interval,
        };

        for device in DeviceId::range(self.config.device_count) {
            let rng = self.device_rng(device);
            let handle = runtime.spawn(Self::device_loop(
                Arc::clone(&self.broker),
                device,
                schedule.clone(),
                rng,
                Arc::clone(&self.counters),
            ));
            tasks.push(DeviceTask { device, handle });
        }

        tracing::info!(
            "Event generator started for {} devices on {} broker",
            tasks.len(),
            self.broker.name()
        );
        Ok(())
    }

    /// Cancel every device schedule and wait until each task has ended.
    ///
    /// Nothing is published by this generator once `stop` returns. Idempotent.
    pub async fn stop(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        if tasks.is_empty() {
            tracing::debug!("Event generator already stopped");
            return;
        }

        for task in &tasks {
            task.handle.abort();
        }

        let count = tasks.len();
        for task in tasks {
            match task.handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::warn!("Schedule for device {} ended abnormally: {}", task.device, e),
            }
        }

        tracing::info!("Event generator stopped ({} device schedules cancelled)", count);
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Number of device schedules currently running.
    pub fn active_devices(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            published: self.counters.published.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    fn device_rng(&self, device: DeviceId) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(device.as_u32()))),
            None => StdRng::from_os_rng(),
        }
    }

    async fn device_loop(
        broker: Arc<dyn MessageBroker>,
        device: DeviceId,
        schedule: Schedule,
        mut rng: StdRng,
        counters: Arc<Counters>,
    ) {
        let topic = device.topic();

        let jitter = random_delay(&mut rng, Duration::ZERO..schedule.initial_jitter);
        tracing::debug!("Device {} starts in {:?}", device, jitter);
        tokio::time::sleep(jitter).await;

        loop {
            let kind = HeadphoneEventKind::ALL[rng.random_range(0..HeadphoneEventKind::ALL.len())];
            let event = HeadphoneEvent::new(device, kind);

            match event.to_payload() {
                Ok(payload) => match broker.publish(&topic, &payload).await {
                    Ok(()) => {
                        counters.published.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!("Device {} published {}", device, kind);
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("Failed to publish {} for device {}: {}", kind, device, e);
                    }
                },
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Failed to encode event for device {}: {}", device, e);
                }
            }

            tokio::time::sleep(random_delay(&mut rng, schedule.interval.clone())).await;
        }
    }
}

impl std::fmt::Debug for EventGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventGenerator")
            .field("broker", &self.broker.name())
            .field("config", &self.config)
            .field("active_devices", &self.active_devices())
            .finish()
    }
}

/// Uniform delay in `[start, end)` at millisecond resolution; `start` when the range is empty.
fn random_delay(rng: &mut impl Rng, range: Range<Duration>) -> Duration {
    let start = range.start.as_millis() as u64;
    let end = range.end.as_millis() as u64;
    if end <= start {
        return range.start;
    }
    Duration::from_millis(rng.random_range(start..end))
}
