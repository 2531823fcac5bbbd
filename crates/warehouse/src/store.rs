//! Storage seam used by the pipeline coordinator.

use crate::client::WarehouseClient;
use async_trait::async_trait;
use serde_json::Value;

/// Bronze and gold operations of the pipeline.
///
/// Every method reports failure through its return value; none of them
/// returns an error or panics.
#[async_trait]
pub trait EnrichmentStore: Send + Sync {
    /// Lands raw records in bronze; returns the attempt count.
    async fn write_bronze(&self, records: &[Value]) -> usize;

    /// Promotes PROCESSING bronze rows to gold.
    async fn promote_bronze_to_gold(&self) -> bool;

    /// Cheap connectivity probe.
    async fn is_healthy(&self) -> bool;
}

#[async_trait]
impl EnrichmentStore for WarehouseClient {
    async fn write_bronze(&self, records: &[Value]) -> usize {
        crate::bronze::write_bronze(self, records).await
    }

    async fn promote_bronze_to_gold(&self) -> bool {
        crate::gold::promote_bronze_to_gold(self).await
    }

    async fn is_healthy(&self) -> bool {
        crate::health::check_connection(self).await
    }
}
