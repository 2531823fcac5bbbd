//! Enrichment Pipeline
//!
//! Periodic ingestion of enrichment-job records:
//! - Paginated fetch from the source API (bearer auth, bounded retry)
//! - Idempotent landing in the bronze table
//! - Promotion of PROCESSING rows to the gold table with derived metrics

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use source_client::{EnrichmentSource, HttpSource};
use telemetry::{health, init_tracing_from_env};
use warehouse::WarehouseClient;
use worker::{IngestionScheduler, PipelineCoordinator};

use crate::config::{load_config, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting Enrichment Pipeline v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;

    info!(
        api_url = %config.api_url,
        db_host = %config.db_host,
        db_port = config.db_port,
        interval_secs = config.interval,
        page = config.page,
        limit = config.limit,
        max_pages = config.max_pages,
        "Loaded configuration"
    );

    // Initialize source client
    let source = Arc::new(
        HttpSource::new(config.source()).context("Failed to create source API client")?,
    );

    // Initialize warehouse client (connects lazily)
    let warehouse = Arc::new(WarehouseClient::new(config.warehouse()));

    // Initialize warehouse schema
    if let Err(e) = warehouse::schema::init_schema(&warehouse).await {
        error!("Failed to initialize warehouse schema: {}", e);
        // Continue anyway - tables might already exist or the database may come up later
    }

    // Check health and update status
    check_health(&config, &*source, &warehouse).await;

    let coordinator = PipelineCoordinator::new(source, warehouse.clone(), config.retry());
    let scheduler = IngestionScheduler::new(config.scheduler(), coordinator);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        if shutdown_tx.send(true).is_err() {
            warn!("Scheduler already stopped");
        }
    });

    scheduler.run(shutdown_rx).await;

    // Cleanup
    info!("Shutting down...");
    warehouse.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Check component health on startup.
async fn check_health(config: &AppConfig, source: &dyn EnrichmentSource, warehouse: &WarehouseClient) {
    // Check source API
    if source_client::health::check_connection(source).await {
        health().source_api.set_healthy();
        info!(api_url = %config.api_url, "Source API: healthy");
    } else {
        health().source_api.set_unhealthy("Connection failed");
        error!(api_url = %config.api_url, "Source API: unhealthy");
    }

    // Check warehouse
    if warehouse::health::check_connection(warehouse).await {
        health().warehouse.set_healthy();
        info!("Warehouse connection: healthy");
    } else {
        health().warehouse.set_unhealthy("Connection failed");
        error!("Warehouse connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
