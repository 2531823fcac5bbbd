//! Source API configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use engine_core::{Error, Result};

/// Path of the paginated enrichment listing, relative to the API base URL.
pub const ENRICHMENTS_PATH: &str = "people/v1/enrichments";

/// Source API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// API base URL (e.g., "http://localhost:3000")
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Opaque bearer credential
    #[serde(default)]
    pub api_key: String,
    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SourceConfig {
    /// Full URL of the enrichment listing endpoint.
    ///
    /// A path already present on the base URL is kept, so an API mounted
    /// under a prefix still resolves correctly.
    pub fn enrichments_url(&self) -> Result<Url> {
        let mut base = Url::parse(&self.api_url)
            .map_err(|e| Error::config(format!("invalid API_URL {:?}: {}", self.api_url, e)))?;

        if base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "API_URL {:?} cannot be used as a base URL",
                self.api_url
            )));
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(ENRICHMENTS_PATH)
            .map_err(|e| Error::config(format!("invalid enrichments URL: {}", e)))
    }
}
