//! Ingestion scheduler: runs the pipeline on a fixed interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

use telemetry::{health, metrics};

use crate::pipeline::{IterationContext, IterationReport, PipelineCoordinator};

/// Scheduler configuration. Set once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Idle time after each iteration
    pub interval: Duration,
    /// First page fetched per iteration
    pub page: u32,
    /// Records per page
    pub limit: u32,
    /// Pages fetched per iteration at most
    pub max_pages: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            page: 1,
            limit: 100,
            max_pages: 1,
        }
    }
}

/// Periodic driver of [`PipelineCoordinator`].
pub struct IngestionScheduler {
    config: SchedulerConfig,
    coordinator: PipelineCoordinator,
    iteration: AtomicU64,
}

impl IngestionScheduler {
    pub fn new(config: SchedulerConfig, coordinator: PipelineCoordinator) -> Self {
        Self {
            config,
            coordinator,
            iteration: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of iterations started so far.
    pub fn iterations(&self) -> u64 {
        self.iteration.load(Ordering::Relaxed)
    }

    /// Runs a single iteration inside its own span.
    pub async fn run_once(&self) -> IterationReport {
        let n = self.iteration.fetch_add(1, Ordering::Relaxed) + 1;
        let ctx = IterationContext::new(
            n,
            self.config.page,
            self.config.limit,
            self.config.max_pages,
        );

        let span = info_span!("iteration", iteration = n, run_id = %ctx.run_id);
        let report = self.coordinator.run_iteration(&ctx).instrument(span).await;

        log_metrics_snapshot();
        report
    }

    /// Loops until `shutdown` turns true.
    ///
    /// An iteration in progress always completes; the shutdown is observed
    /// before each fetch and during the idle sleep. A closed channel counts
    /// as a shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            page = self.config.page,
            limit = self.config.limit,
            max_pages = self.config.max_pages,
            "Ingestion scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_once().await;

            info!(
                sleep_secs = self.config.interval.as_secs(),
                "Waiting for next iteration"
            );
            if !idle(self.config.interval, &mut shutdown).await {
                info!("Scheduler received shutdown signal");
                break;
            }
        }

        info!(iterations = self.iterations(), "Ingestion scheduler stopped");
    }
}

/// Sleeps for `interval`. Returns false if shutdown was requested first.
async fn idle(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}

fn log_metrics_snapshot() {
    let s = metrics().snapshot();
    info!(
        iterations = s.iterations_completed,
        records_fetched = s.records_fetched,
        fetch_errors = s.fetch_errors,
        fetch_retries = s.fetch_retries,
        bronze_attempted = s.bronze_attempted,
        bronze_landed = s.bronze_landed,
        bronze_rejected = s.bronze_rejected,
        transform_failures = s.transform_failures,
        gold_rows_upserted = s.gold_rows_upserted,
        iteration_mean_ms = s.iteration_latency_mean_ms,
        iteration_p95_ms = s.iteration_latency_p95_ms,
        processing_rows_scanned = s.processing_rows_scanned,
        "Pipeline metrics"
    );

    let report = health().report();
    if report.status.is_healthy() {
        info!("All components healthy");
    } else {
        warn!(
            status = ?report.status,
            failing = ?report.failing(),
            "Pipeline health degraded"
        );
    }
}
