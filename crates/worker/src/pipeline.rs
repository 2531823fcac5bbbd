//! Pipeline coordinator: one fetch → bronze → gold iteration.

use chrono::{DateTime, Utc};
use engine_core::Result;
use serde::Serialize;
use source_client::{EnrichmentSource, Page};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use warehouse::EnrichmentStore;

use crate::retry::RetryPolicy;

/// Per-iteration context handed to every stage.
#[derive(Debug, Clone)]
pub struct IterationContext {
    /// 1-based iteration number
    pub iteration: u64,
    /// Correlation id for this iteration's logs
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// First page to fetch
    pub page: u32,
    /// Records per page
    pub limit: u32,
    /// Upper bound on pages fetched in one iteration
    pub max_pages: u32,
}

impl IterationContext {
    pub fn new(iteration: u64, page: u32, limit: u32, max_pages: u32) -> Self {
        Self {
            iteration,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            page,
            limit,
            max_pages: max_pages.max(1),
        }
    }
}

/// What one iteration did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationReport {
    pub iteration: u64,
    pub run_id: Uuid,
    pub pages_fetched: u32,
    pub records_received: usize,
    /// Sum of the bronze writer's attempt counts
    pub bronze_attempted: usize,
    /// The first fetch failed; bronze and transform were skipped
    pub fetch_failed: bool,
    /// `None` when the transform was skipped
    pub transform_succeeded: Option<bool>,
    pub elapsed: Duration,
}

impl IterationReport {
    fn start(ctx: &IterationContext) -> Self {
        Self {
            iteration: ctx.iteration,
            run_id: ctx.run_id,
            pages_fetched: 0,
            records_received: 0,
            bronze_attempted: 0,
            fetch_failed: false,
            transform_succeeded: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// Drives the three stages strictly in order.
pub struct PipelineCoordinator {
    source: Arc<dyn EnrichmentSource>,
    store: Arc<dyn EnrichmentStore>,
    retry: RetryPolicy,
}

impl PipelineCoordinator {
    pub fn new(
        source: Arc<dyn EnrichmentSource>,
        store: Arc<dyn EnrichmentStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            store,
            retry,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Runs one iteration. Never fails; the outcome is in the report.
    pub async fn run_iteration(&self, ctx: &IterationContext) -> IterationReport {
        let start = Instant::now();
        let m = metrics();
        m.iterations_started.inc();
        m.last_iteration.set(ctx.iteration);

        let mut report = IterationReport::start(ctx);
        let mut page_no = ctx.page;

        loop {
            let page = match self.fetch_with_retry(page_no, ctx.limit).await {
                Ok(page) => page,
                Err(e) => {
                    health().source_api.set_unhealthy(e.to_string());
                    if report.pages_fetched == 0 {
                        error!(
                            code = e.error_code().unwrap_or_default(),
                            page = page_no,
                            "Fetch failed, skipping bronze and transform: {}",
                            e
                        );
                        report.fetch_failed = true;
                        return self.finish(report, start);
                    }
                    warn!(
                        code = e.error_code().unwrap_or_default(),
                        page = page_no,
                        "Follow-up page failed, stopping pagination: {}",
                        e
                    );
                    break;
                }
            };

            health().source_api.set_healthy();
            report.pages_fetched += 1;
            report.records_received += page.len();
            m.pages_fetched.inc();
            m.records_fetched.inc_by(page.len() as u64);

            info!(page = page_no, records = page.len(), "Fetched page");

            report.bronze_attempted += self.store.write_bronze(&page.data).await;

            if !self.should_continue(ctx, &report, &page) {
                break;
            }
            page_no = match page_no.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        let transformed = self.store.promote_bronze_to_gold().await;
        if transformed {
            health().warehouse.set_healthy();
        } else {
            health().warehouse.set_unhealthy("gold transform failed");
        }
        report.transform_succeeded = Some(transformed);

        self.finish(report, start)
    }

    fn should_continue(&self, ctx: &IterationContext, report: &IterationReport, page: &Page) -> bool {
        report.pages_fetched < ctx.max_pages && !page.is_empty() && page.has_next()
    }

    fn finish(&self, mut report: IterationReport, start: Instant) -> IterationReport {
        report.elapsed = start.elapsed();
        let m = metrics();
        m.iterations_completed.inc();
        m.iteration_latency_ms.observe(report.elapsed.as_millis() as u64);

        info!(
            pages = report.pages_fetched,
            received = report.records_received,
            bronze_attempted = report.bronze_attempted,
            fetch_failed = report.fetch_failed,
            transform = ?report.transform_succeeded,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Iteration complete"
        );
        report
    }

    /// Fetches one page, retrying retryable failures with backoff.
    async fn fetch_with_retry(&self, page: u32, limit: u32) -> Result<Page> {
        let m = metrics();
        let mut attempt = 0;

        loop {
            let start = Instant::now();
            match self.source.fetch(page, limit).await {
                Ok(body) => {
                    m.fetch_latency_ms.observe(start.elapsed().as_millis() as u64);
                    return Ok(body);
                }
                Err(e) => {
                    m.fetch_errors.inc();
                    if !e.is_retryable() || attempt >= self.retry.max_retries {
                        debug!(attempt, retryable = e.is_retryable(), "Giving up on fetch");
                        return Err(e);
                    }

                    let backoff = self.retry.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        backoff_ms = %backoff.as_millis(),
                        source = self.source.name(),
                        "Retrying fetch: {}",
                        e
                    );
                    m.fetch_retries.inc();
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
