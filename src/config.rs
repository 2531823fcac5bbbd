//! Process configuration.
//!
//! Layered as defaults, then an optional `config/default.toml`, then the
//! environment (`.env` is loaded first by `main`). Environment keys are the
//! upper-case field names, e.g. `DB_HOST` or `MAX_PAGES`.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

use source_client::SourceConfig;
use warehouse::WarehouseConfig;
use worker::{RetryPolicy, SchedulerConfig};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    pub db_host: String,
    pub db_port: u16,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
    #[validate(range(min = 1))]
    pub db_pool_size: u32,
    #[validate(range(min = 1))]
    pub db_acquire_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,

    /// Seconds between iterations
    #[validate(range(min = 1))]
    pub interval: u64,
    #[validate(range(min = 1))]
    pub page: u32,
    #[validate(range(min = 1))]
    pub limit: u32,
    #[validate(range(min = 1))]
    pub max_pages: u32,

    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let source = SourceConfig::default();
        let warehouse = WarehouseConfig::default();
        let scheduler = SchedulerConfig::default();
        let retry = RetryPolicy::default();

        Self {
            api_url: source.api_url,
            api_key: source.api_key,
            request_timeout_secs: source.request_timeout_secs,
            db_host: warehouse.host,
            db_port: warehouse.port,
            db_user: None,
            db_password: None,
            db_name: None,
            db_pool_size: warehouse.pool_size,
            db_acquire_timeout_secs: warehouse.acquire_timeout_secs,
            db_idle_timeout_secs: warehouse.idle_timeout_secs,
            interval: scheduler.interval.as_secs(),
            page: scheduler.page,
            limit: scheduler.limit,
            max_pages: scheduler.max_pages,
            max_retries: retry.max_retries,
            retry_base_delay_ms: retry.base_delay.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn source(&self) -> SourceConfig {
        SourceConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn warehouse(&self) -> WarehouseConfig {
        WarehouseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            username: non_empty(&self.db_user),
            password: non_empty(&self.db_password),
            database: non_empty(&self.db_name),
            pool_size: self.db_pool_size,
            acquire_timeout_secs: self.db_acquire_timeout_secs,
            idle_timeout_secs: self.db_idle_timeout_secs,
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.interval),
            page: self.page,
            limit: self.limit,
            max_pages: self.max_pages,
        }
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Load configuration from files and environment.
pub fn load_config() -> Result<AppConfig> {
    load_config_with(::config::Environment::default())
}

fn load_config_with(env: ::config::Environment) -> Result<AppConfig> {
    let config = ::config::Config::builder()
        // Start with defaults
        .add_source(::config::Config::try_from(&AppConfig::default())?)
        // Load from config file if exists
        .add_source(
            ::config::File::with_name("config/default")
                .required(false)
                .format(::config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(env)
        .build()
        .context("Failed to build configuration")?;

    let config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
