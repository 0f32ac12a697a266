//! Sinks: where tracked observations end up
//!
//! The client only needs [`Sink::record_time`] and [`Sink::increment_count`].
//! Network transports live outside this crate; the sinks here are:
//!
//! - [`MemorySink`]: keeps everything in memory for assertions and inspection
//! - [`LogSink`]: emits every observation as a structured `tracing` event
//! - [`NoopSink`]: drops everything

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Destination for timer and counter observations.
pub trait Sink: Send + Sync + Debug {
    /// Record one duration under `bucket`.
    fn record_time(&self, bucket: &str, elapsed: Duration);

    /// Add `n` to the counter `bucket`.
    fn increment_count(&self, bucket: &str, n: u64);

    /// Drop all recorded state. Sinks without state ignore this.
    fn reset(&self) {}
}

/// A recorded timer observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMetric {
    pub bucket: String,
    pub elapsed: Duration,
}

/// In-memory sink.
///
/// Timer observations are kept in arrival order; counters are cumulative per
/// bucket.
#[derive(Debug, Default)]
pub struct MemorySink {
    times: Mutex<Vec<TimeMetric>>,
    counts: RwLock<HashMap<String, AtomicU64>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of timer observations, oldest first.
    pub fn time_metrics(&self) -> Vec<TimeMetric> {
        self.times.lock().clone()
    }

    /// Snapshot of all counters.
    pub fn count_metrics(&self) -> HashMap<String, u64> {
        self.counts
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// Current value of one counter (0 when absent).
    pub fn count(&self, bucket: &str) -> u64 {
        self.counts
            .read()
            .get(bucket)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Sink for MemorySink {
    fn record_time(&self, bucket: &str, elapsed: Duration) {
        self.times.lock().push(TimeMetric {
            bucket: bucket.to_string(),
            elapsed,
        });
    }

    fn increment_count(&self, bucket: &str, n: u64) {
        // Fast path: existing counter
        {
            let counts = self.counts.read();
            if let Some(counter) = counts.get(bucket) {
                counter.fetch_add(n, Ordering::Relaxed);
                return;
            }
        }

        // Slow path: create new counter
        let mut counts = self.counts.write();
        counts
            .entry(bucket.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(n, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.times.lock().clear();
        self.counts.write().clear();
    }
}

/// Sink that logs each observation at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn record_time(&self, bucket: &str, elapsed: Duration) {
        info!(
            target: "stats_buckets::sink",
            bucket,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Stats timer"
        );
    }

    fn increment_count(&self, bucket: &str, n: u64) {
        info!(target: "stats_buckets::sink", bucket, delta = n, "Stats counter");
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn record_time(&self, _bucket: &str, _elapsed: Duration) {}

    fn increment_count(&self, _bucket: &str, _n: u64) {}
}
