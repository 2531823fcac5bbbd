//! Source API health checks.

use crate::client::EnrichmentSource;
use tracing::{debug, error};

/// Probe the source with a one-record fetch.
pub async fn check_connection(source: &dyn EnrichmentSource) -> bool {
    match source.fetch(1, 1).await {
        Ok(_) => {
            debug!(source = source.name(), "Source API reachable");
            true
        }
        Err(e) => {
            error!(source = source.name(), "Source API health check failed: {}", e);
            false
        }
    }
}
