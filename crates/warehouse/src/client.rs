//! Postgres pool wrapper.

use crate::config::WarehouseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Warehouse client over a lazily-connected pool.
///
/// No connection is opened until the first operation, and idle ones are
/// closed well before the next iteration, so nothing stays pinned across
/// the scheduler's sleep.
#[derive(Clone)]
pub struct WarehouseClient {
    pool: PgPool,
    config: WarehouseConfig,
}

impl WarehouseClient {
    /// Creates a new warehouse client. Never touches the network.
    pub fn new(config: WarehouseConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .min_connections(0)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect_lazy_with(config.connect_options());

        info!(
            host = %config.host,
            port = config.port,
            database = config.database.as_deref().unwrap_or("<default>"),
            pool_size = config.pool_size,
            "Created warehouse client"
        );

        Self { pool, config }
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool, config: WarehouseConfig) -> Self {
        Self { pool, config }
    }

    /// Returns the inner pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
