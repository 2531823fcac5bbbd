//! Bronze and gold row shapes and the bronze → gold derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::SizeCategory;
use crate::record::{EnrichmentRecord, STATUS_DONE, STATUS_PROCESSING};

/// Extracted columns of a bronze row (everything except the audit payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BronzeRow {
    pub id: String,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
    pub total_contacts: i64,
    pub contact_type: Option<String>,
    pub processing_status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BronzeRow {
    pub fn is_processing(&self) -> bool {
        self.processing_status.as_deref() == Some(STATUS_PROCESSING)
    }
}

impl From<&EnrichmentRecord> for BronzeRow {
    fn from(record: &EnrichmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            workspace_id: record.workspace_id.clone(),
            workspace_name: record.workspace_name.clone(),
            total_contacts: record.total_contacts,
            contact_type: record.contact_type.clone(),
            processing_status: record.processing_status.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Gold row: bronze fields plus computed business metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldRow {
    pub id: String,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
    pub total_contacts: i64,
    pub contact_type: Option<String>,
    pub processing_status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub duration_minutes: f64,
    pub minutes_per_contact: f64,
    pub success: bool,
    pub size_category: SizeCategory,
    pub needs_reprocessing: bool,
}

impl GoldRow {
    /// Derives the gold row for a bronze row picked up by the transform.
    ///
    /// Duration metrics stay at zero until timestamp-based timing lands;
    /// the columns exist so that logic can fill them without a schema change.
    pub fn derive(bronze: &BronzeRow) -> Self {
        Self {
            id: bronze.id.clone(),
            workspace_id: bronze.workspace_id.clone(),
            workspace_name: bronze.workspace_name.clone(),
            total_contacts: bronze.total_contacts,
            contact_type: bronze.contact_type.clone(),
            processing_status: STATUS_DONE.to_string(),
            created_at: bronze.created_at,
            updated_at: bronze.updated_at,
            duration_minutes: 0.0,
            minutes_per_contact: 0.0,
            success: true,
            size_category: SizeCategory::from_total_contacts(bronze.total_contacts),
            needs_reprocessing: false,
        }
    }
}
