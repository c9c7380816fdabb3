//! Broker benchmark
//!
//! Runs the same workload against any [`MessageBroker`] and records how it
//! behaved: connection time, parallel and sequential throughput, delivery
//! latency and the error rate of publishes nobody listens to.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use headphone_broker::perf::{PerfSettings, PerformanceReport, PerformanceTester};
//! use headphone_broker::MemoryBroker;
//!
//! # async fn run() -> Result<(), headphone_broker::perf::PerfError> {
//! let tester = PerformanceTester::new(PerfSettings::default());
//! let mut report = PerformanceReport::new();
//! report.add(tester.run(Arc::new(MemoryBroker::new()), "Memory").await?);
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::broker::{handler, MessageBroker};
use crate::error::BrokerError;

const PARALLEL_TOPIC: &str = "parallel-throughput-test";
const SEQUENTIAL_TOPIC: &str = "sequential-throughput-test";
const LATENCY_TOPIC: &str = "latency-test";

/// Benchmark failures.
#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("failed to encode latency payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{phase} test timed out after {waited:?}: received {received}/{expected}")]
    DeliveryTimeout {
        phase: &'static str,
        received: usize,
        expected: usize,
        waited: Duration,
    },
}

/// Workload sizes and waits for each phase.
#[derive(Debug, Clone)]
pub struct PerfSettings {
    /// Messages published concurrently
    /// Default: 10000
    pub parallel_messages: usize,

    /// Messages published one after another
    /// Default: 10000
    pub sequential_messages: usize,

    /// Timestamped probes for the latency phase
    /// Default: 1000
    pub latency_iterations: usize,

    /// Publishes to unsubscribed topics
    /// Default: 1000
    pub error_operations: usize,

    /// How long the parallel phase waits for deliveries before reporting itself incomplete
    /// Default: 6 seconds
    pub parallel_wait: Duration,

    /// How long the sequential and latency phases wait before failing
    /// Default: 60 seconds
    pub delivery_wait: Duration,

    /// Delivery polling period
    /// Default: 1ms
    pub poll_interval: Duration,
}

impl Default for PerfSettings {
    fn default() -> Self {
        Self {
            parallel_messages: 10_000,
            sequential_messages: 10_000,
            latency_iterations: 1_000,
            error_operations: 1_000,
            parallel_wait: Duration::from_secs(6),
            delivery_wait: Duration::from_secs(60),
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl PerfSettings {
    /// A small workload for smoke runs.
    pub fn quick() -> Self {
        Self {
            parallel_messages: 500,
            sequential_messages: 500,
            latency_iterations: 100,
            error_operations: 100,
            parallel_wait: Duration::from_secs(5),
            delivery_wait: Duration::from_secs(5),
            ..Self::default()
        }
    }
}

/// What one broker achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub broker: String,
    /// Messages per second; `None` when deliveries did not complete in time
    pub parallel_throughput: Option<f64>,
    pub sequential_throughput: f64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub max_latency_ms: f64,
    pub connection_time: Duration,
    /// Percentage of failed publishes
    pub error_rate: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatencyProbe {
    id: usize,
    timestamp: i64,
}

/// Timestamped payload for one latency round trip.
fn latency_payload(id: usize) -> Result<String, PerfError> {
    let probe = LatencyProbe {
        id,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    Ok(serde_json::to_string(&probe)?)
}

struct LatencyStats {
    avg: f64,
    p95: f64,
    max: f64,
}

/// Runs the benchmark phases against a broker.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTester {
    settings: PerfSettings,
}

impl PerformanceTester {
    pub fn new(settings: PerfSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PerfSettings {
        &self.settings
    }

    /// Connect, run every phase, disconnect.
    ///
    /// The broker is disconnected even when a phase fails.
    pub async fn run(
        &self,
        broker: Arc<dyn MessageBroker>,
        label: &str,
    ) -> Result<PerformanceMetrics, PerfError> {
        tracing::info!("Testing {} broker performance", label);
        let started = Instant::now();

        let connect_start = Instant::now();
        broker.connect().await?;
        let connection_time = connect_start.elapsed();
        tracing::debug!("{} connection took {:?}", label, connection_time);

        let result = self.measure(broker.as_ref(), label, connection_time).await;

        if let Err(e) = broker.disconnect().await {
            tracing::warn!("Failed to disconnect {} broker after benchmark: {}", label, e);
        }

        tracing::info!("{} broker benchmark finished in {:?}", label, started.elapsed());
        result
    }

    async fn measure(
        &self,
        broker: &dyn MessageBroker,
        label: &str,
        connection_time: Duration,
    ) -> Result<PerformanceMetrics, PerfError> {
        let parallel_throughput = self.parallel_throughput(broker).await?;
        match parallel_throughput {
            Some(rate) => tracing::info!("{} parallel throughput: {:.0} msg/s", label, rate),
            None => tracing::warn!("{} parallel throughput test did not complete", label),
        }

        let sequential_throughput = self.sequential_throughput(broker).await?;
        tracing::info!("{} sequential throughput: {:.0} msg/s", label, sequential_throughput);

        let latency = self.latency(broker).await?;
        tracing::info!(
            "{} latency avg {:.2}ms, p95 {:.2}ms, max {:.2}ms",
            label,
            latency.avg,
            latency.p95,
            latency.max
        );

        let error_rate = self.error_rate(broker).await;
        tracing::info!("{} error rate: {:.2}%", label, error_rate);

        Ok(PerformanceMetrics {
            broker: label.to_string(),
            parallel_throughput,
            sequential_throughput,
            avg_latency_ms: latency.avg,
            p95_latency_ms: latency.p95,
            max_latency_ms: latency.max,
            connection_time,
            error_rate,
        })
    }

    async fn parallel_throughput(&self, broker: &dyn MessageBroker) -> Result<Option<f64>, PerfError> {
        let expected = self.settings.parallel_messages;
        let received = counting_subscription(broker, PARALLEL_TOPIC).await?;

        let payloads: Vec<String> = (0..expected).map(|i| format!("message-{}", i)).collect();
        let start = Instant::now();
        let results =
            futures::future::join_all(payloads.iter().map(|p| broker.publish(PARALLEL_TOPIC, p))).await;
        results.into_iter().collect::<Result<Vec<()>, BrokerError>>()?;

        let completed = self
            .wait_for(&received, expected, self.settings.parallel_wait)
            .await;
        let elapsed = start.elapsed();
        broker.unsubscribe(PARALLEL_TOPIC).await?;

        Ok(completed.then(|| rate(expected, elapsed)))
    }

    async fn sequential_throughput(&self, broker: &dyn MessageBroker) -> Result<f64, PerfError> {
        let expected = self.settings.sequential_messages;
        let received = counting_subscription(broker, SEQUENTIAL_TOPIC).await?;

        let start = Instant::now();
        for i in 0..expected {
            broker
                .publish(SEQUENTIAL_TOPIC, &format!("message-{}", i))
                .await?;
        }

        let completed = self
            .wait_for(&received, expected, self.settings.delivery_wait)
            .await;
        let elapsed = start.elapsed();
        broker.unsubscribe(SEQUENTIAL_TOPIC).await?;

        if !completed {
            return Err(PerfError::DeliveryTimeout {
                phase: "sequential throughput",
                received: received.load(Ordering::SeqCst),
                expected,
                waited: self.settings.delivery_wait,
            });
        }
        Ok(rate(expected, elapsed))
    }

    async fn latency(&self, broker: &dyn MessageBroker) -> Result<LatencyStats, PerfError> {
        let iterations = self.settings.latency_iterations;
        let latencies = Arc::new(Mutex::new(Vec::with_capacity(iterations)));
        let received = Arc::new(AtomicUsize::new(0));

        let sink = Arc::clone(&latencies);
        let counter = Arc::clone(&received);
        broker
            .subscribe(
                LATENCY_TOPIC,
                handler(move |payload| {
                    if let Ok(probe) = serde_json::from_str::<LatencyProbe>(&payload) {
                        let latency = chrono::Utc::now().timestamp_millis() - probe.timestamp;
                        sink.lock().push(latency.max(0) as f64);
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await?;

        for id in 0..iterations {
            let payload = latency_payload(id)?;
            broker.publish(LATENCY_TOPIC, &payload).await?;

            if id % 100 == 0 {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }

        let completed = self
            .wait_for(&received, iterations, self.settings.delivery_wait)
            .await;
        broker.unsubscribe(LATENCY_TOPIC).await?;

        if !completed {
            return Err(PerfError::DeliveryTimeout {
                phase: "latency",
                received: received.load(Ordering::SeqCst),
                expected: iterations,
                waited: self.settings.delivery_wait,
            });
        }

        let mut samples = std::mem::take(&mut *latencies.lock());
        Ok(latency_stats(&mut samples))
    }

    async fn error_rate(&self, broker: &dyn MessageBroker) -> f64 {
        let total = self.settings.error_operations;
        if total == 0 {
            return 0.0;
        }

        let mut errors = 0usize;
        for i in 0..total {
            if let Err(e) = broker
                .publish(&format!("error-test-{}", i), &format!("message-{}", i))
                .await
            {
                errors += 1;
                tracing::debug!("Publish {} failed: {}", i, e);
            }
        }

        errors as f64 / total as f64 * 100.0
    }

    /// Poll until `counter` reaches `expected` or `limit` elapses.
    async fn wait_for(&self, counter: &AtomicUsize, expected: usize, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let received = counter.load(Ordering::SeqCst);
            if received >= expected {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!("Stopped waiting after {:?}: {}/{} delivered", limit, received, expected);
                return false;
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

async fn counting_subscription(
    broker: &dyn MessageBroker,
    topic: &str,
) -> Result<Arc<AtomicUsize>, BrokerError> {
    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    broker
        .subscribe(
            topic,
            handler(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await?;
    Ok(received)
}

fn rate(messages: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        messages as f64 / seconds
    } else {
        f64::INFINITY
    }
}

fn latency_stats(samples: &mut [f64]) -> LatencyStats {
    if samples.is_empty() {
        return LatencyStats {
            avg: 0.0,
            p95: 0.0,
            max: 0.0,
        };
    }

    samples.sort_by(f64::total_cmp);
    let avg = samples.iter().sum::<f64>() / samples.len() as f64;
    let p95_index = ((samples.len() as f64 * 0.95) as usize).min(samples.len() - 1);

    LatencyStats {
        avg,
        p95: samples[p95_index],
        max: samples[samples.len() - 1],
    }
}

/// Results of several benchmark runs.
#[derive(Debug, Clone, Default)]
pub struct PerformanceReport {
    results: Vec<PerformanceMetrics>,
}

impl PerformanceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, metrics: PerformanceMetrics) {
        tracing::debug!("Added result for {} broker", metrics.broker);
        self.results.push(metrics);
    }

    pub fn results(&self) -> &[PerformanceMetrics] {
        &self.results
    }

    /// Highest parallel throughput among runs that completed.
    pub fn fastest_parallel(&self) -> Option<&PerformanceMetrics> {
        self.results
            .iter()
            .filter(|m| m.parallel_throughput.is_some())
            .max_by(|a, b| {
                let a = a.parallel_throughput.unwrap_or_default();
                let b = b.parallel_throughput.unwrap_or_default();
                a.total_cmp(&b)
            })
    }

    pub fn fastest_sequential(&self) -> Option<&PerformanceMetrics> {
        self.results
            .iter()
            .max_by(|a, b| a.sequential_throughput.total_cmp(&b.sequential_throughput))
    }

    pub fn lowest_latency(&self) -> Option<&PerformanceMetrics> {
        self.results
            .iter()
            .min_by(|a, b| a.avg_latency_ms.total_cmp(&b.avg_latency_ms))
    }

    pub fn most_reliable(&self) -> Option<&PerformanceMetrics> {
        self.results
            .iter()
            .min_by(|a, b| a.error_rate.total_cmp(&b.error_rate))
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BROKER PERFORMANCE COMPARISON")?;
        writeln!(f, "{}", "=".repeat(100))?;
        writeln!(
            f,
            "{:<10} | {:>14} | {:>16} | {:>10} | {:>10} | {:>12} | {:>8}",
            "Broker", "Parallel msg/s", "Sequential msg/s", "Avg ms", "P95 ms", "Connect ms", "Errors %"
        )?;
        writeln!(f, "{}", "-".repeat(100))?;

        for m in &self.results {
            let parallel = m
                .parallel_throughput
                .map(|rate| format!("{:.0}", rate))
                .unwrap_or_else(|| "INCOMPLETE".to_string());
            writeln!(
                f,
                "{:<10} | {:>14} | {:>16.0} | {:>10.2} | {:>10.2} | {:>12.2} | {:>8.2}",
                m.broker,
                parallel,
                m.sequential_throughput,
                m.avg_latency_ms,
                m.p95_latency_ms,
                m.connection_time.as_secs_f64() * 1000.0,
                m.error_rate
            )?;
        }

        if let Some(m) = self.fastest_parallel() {
            writeln!(f, "Fastest parallel throughput: {}", m.broker)?;
        }
        if let Some(m) = self.fastest_sequential() {
            writeln!(f, "Fastest sequential throughput: {}", m.broker)?;
        }
        if let Some(m) = self.lowest_latency() {
            writeln!(f, "Lowest latency: {}", m.broker)?;
        }
        if let Some(m) = self.most_reliable() {
            writeln!(f, "Most reliable: {}", m.broker)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBroker;

    fn metrics(broker: &str, parallel: Option<f64>, latency: f64, errors: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            broker: broker.to_string(),
            parallel_throughput: parallel,
            sequential_throughput: 100.0,
            avg_latency_ms: latency,
            p95_latency_ms: latency,
            max_latency_ms: latency,
            connection_time: Duration::from_millis(1),
            error_rate: errors,
        }
    }

    #[tokio::test]
    async fn test_memory_broker_benchmark() {
        let tester = PerformanceTester::new(PerfSettings::quick());
        let broker: Arc<dyn MessageBroker> = Arc::new(MemoryBroker::new());

        let result = tester.run(Arc::clone(&broker), "Memory").await.unwrap();

        assert_eq!(result.broker, "Memory");
        assert!(result.parallel_throughput.is_some());
        assert!(result.sequential_throughput > 0.0);
        assert!(result.p95_latency_ms <= result.max_latency_ms);
        assert_eq!(result.error_rate, 0.0);
        assert!(!broker.is_connected());
    }

    #[test]
    fn test_latency_stats() {
        let mut samples: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        let stats = latency_stats(&mut samples);
        assert_eq!(stats.avg, 10.5);
        assert_eq!(stats.p95, 20.0);
        assert_eq!(stats.max, 20.0);

        let empty = latency_stats(&mut []);
        assert_eq!(empty.max, 0.0);
    }

    #[test]
    fn test_report_queries() {
        let mut report = PerformanceReport::new();
        assert!(report.fastest_sequential().is_none());

        report.add(metrics("Memory", Some(5000.0), 0.5, 0.0));
        report.add(metrics("Redis", None, 2.0, 0.0));
        report.add(metrics("MQTT", Some(800.0), 0.1, 1.0));

        assert_eq!(report.fastest_parallel().unwrap().broker, "Memory");
        assert_eq!(report.lowest_latency().unwrap().broker, "MQTT");
        assert_eq!(report.most_reliable().unwrap().broker, "Memory");

        let table = report.to_string();
        assert!(table.contains("INCOMPLETE"));
        assert!(table.contains("Lowest latency: MQTT"));
    }

    #[test]
    fn test_latency_payload_decodes() {
        let payload = latency_payload(7).unwrap();
        let probe: LatencyProbe = serde_json::from_str(&payload).unwrap();
        assert_eq!(probe.id, 7);
        assert!(probe.timestamp > 0);
    }

    #[test]
    fn test_encode_error_is_reported() {
        let source = serde_json::from_str::<LatencyProbe>("").unwrap_err();
        let err = PerfError::from(source);
        assert!(matches!(err, PerfError::Encode(_)));
        assert!(err.to_string().starts_with("failed to encode latency payload"));
    }
}
