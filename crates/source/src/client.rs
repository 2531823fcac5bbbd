//! Fetcher for the enrichment listing.
//!
//! One call is one HTTP round trip. Retry policy belongs to the caller;
//! [`engine_core::Error::is_retryable`] tells it which failures are worth
//! another attempt.

use async_trait::async_trait;
use engine_core::{Error, FetchErrorCode, Result};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::SourceConfig;
use crate::page::Page;

/// Longest slice of an error body kept in the error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// A paginated source of enrichment records.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Fetches one page. `page` starts at 1 and `limit` must be positive.
    async fn fetch(&self, page: u32, limit: u32) -> Result<Page>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Checks the arguments of a fetch before any I/O happens.
pub fn validate_request(page: u32, limit: u32) -> Result<()> {
    if page < 1 {
        return Err(Error::validation(format!("page must be >= 1, got {}", page)));
    }
    if limit == 0 {
        return Err(Error::validation("limit must be > 0"));
    }
    Ok(())
}

/// reqwest-backed source talking to `GET {API_URL}/people/v1/enrichments`.
#[derive(Clone)]
pub struct HttpSource {
    http_client: reqwest::Client,
    endpoint: Url,
    config: SourceConfig,
}

impl HttpSource {
    /// Creates a new HTTP source.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let endpoint = config.enrichments_url()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        if config.api_key.is_empty() {
            warn!("API_KEY is empty; requests will carry an empty bearer token");
        }

        debug!(
            endpoint = %endpoint,
            timeout_secs = config.request_timeout_secs,
            "Created source API client"
        );

        Ok(Self {
            http_client,
            endpoint,
            config,
        })
    }

    /// Returns the resolved endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

#[async_trait]
impl EnrichmentSource for HttpSource {
    async fn fetch(&self, page: u32, limit: u32) -> Result<Page> {
        validate_request(page, limit)?;

        debug!(url = %self.endpoint, page, limit, "Fetching enrichments");

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Source API request failed");
                Error::fetch(
                    FetchErrorCode::Transport,
                    format!("request to {} failed: {}", self.endpoint, e),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(status = %status, body = %body, "Source API returned error");
            return Err(Error::http_status(
                status.as_u16(),
                format!("source API returned {}: {}", status, body),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            Error::fetch(
                FetchErrorCode::Transport,
                format!("failed to read response body: {}", e),
            )
        })?;

        let page_body: Page = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "Failed to decode source API response");
            Error::fetch(
                FetchErrorCode::Decode,
                format!("invalid response body: {}", e),
            )
        })?;

        debug!(page, records = page_body.len(), "Fetched page");
        Ok(page_body)
    }

    fn name(&self) -> &str {
        "http"
    }
}
