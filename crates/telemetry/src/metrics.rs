//! Internal metrics collection.
//!
//! Collects pipeline metrics in-memory; the scheduler logs a snapshot after
//! every iteration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [10, 50, 100, 250, 500, 1000, 2500, 5000, 10000, 30000, 60000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Upper bound of the bucket holding quantile `q` (0.0..=1.0), or 0
    /// when nothing was observed.
    pub fn quantile_bound(&self, q: f64) -> u64 {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let rank = ((count as f64) * q.clamp(0.0, 1.0)).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (bucket, &bound) in self.buckets.iter().zip(Self::BUCKET_BOUNDS.iter()) {
            seen += bucket.load(Ordering::Relaxed);
            if seen >= rank {
                return bound;
            }
        }
        Self::BUCKET_BOUNDS[10]
    }
}

/// Collected metrics for the pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Loop
    pub iterations_started: Counter,
    pub iterations_completed: Counter,

    // Fetch
    pub pages_fetched: Counter,
    pub records_fetched: Counter,
    pub fetch_errors: Counter,
    pub fetch_retries: Counter,

    // Bronze
    pub bronze_attempted: Counter,
    pub bronze_landed: Counter,
    pub bronze_rejected: Counter,
    pub bronze_write_errors: Counter,

    // Gold
    pub transform_runs: Counter,
    pub transform_failures: Counter,
    pub gold_rows_upserted: Counter,

    // Latency histograms
    pub fetch_latency_ms: Histogram,
    pub bronze_latency_ms: Histogram,
    pub transform_latency_ms: Histogram,
    pub iteration_latency_ms: Histogram,

    // Gauges
    pub last_iteration: Gauge,
    pub processing_rows_scanned: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub iterations_started: u64,
    pub iterations_completed: u64,
    pub pages_fetched: u64,
    pub records_fetched: u64,
    pub fetch_errors: u64,
    pub fetch_retries: u64,
    pub bronze_attempted: u64,
    pub bronze_landed: u64,
    pub bronze_rejected: u64,
    pub bronze_write_errors: u64,
    pub transform_runs: u64,
    pub transform_failures: u64,
    pub gold_rows_upserted: u64,
    pub fetch_latency_mean_ms: f64,
    pub bronze_latency_mean_ms: f64,
    pub transform_latency_mean_ms: f64,
    pub iteration_latency_mean_ms: f64,
    pub iteration_latency_p95_ms: u64,
    pub last_iteration: u64,
    pub processing_rows_scanned: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            iterations_started: self.iterations_started.get(),
            iterations_completed: self.iterations_completed.get(),
            pages_fetched: self.pages_fetched.get(),
            records_fetched: self.records_fetched.get(),
            fetch_errors: self.fetch_errors.get(),
            fetch_retries: self.fetch_retries.get(),
            bronze_attempted: self.bronze_attempted.get(),
            bronze_landed: self.bronze_landed.get(),
            bronze_rejected: self.bronze_rejected.get(),
            bronze_write_errors: self.bronze_write_errors.get(),
            transform_runs: self.transform_runs.get(),
            transform_failures: self.transform_failures.get(),
            gold_rows_upserted: self.gold_rows_upserted.get(),
            fetch_latency_mean_ms: self.fetch_latency_ms.mean(),
            bronze_latency_mean_ms: self.bronze_latency_ms.mean(),
            transform_latency_mean_ms: self.transform_latency_ms.mean(),
            iteration_latency_mean_ms: self.iteration_latency_ms.mean(),
            iteration_latency_p95_ms: self.iteration_latency_ms.quantile_bound(0.95),
            last_iteration: self.last_iteration.get(),
            processing_rows_scanned: self.processing_rows_scanned.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
