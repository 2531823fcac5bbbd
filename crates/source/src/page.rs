//! Response envelope of the enrichment listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination block returned alongside the records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub total_items: Option<u64>,
    pub total_pages: Option<u32>,
    pub has_next: Option<bool>,
    pub has_previous: Option<bool>,
}

/// One page of raw enrichment records.
///
/// Records stay untyped here; they are mapped to
/// [`engine_core::EnrichmentRecord`] one by one at bronze-write time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Absent or `null` in the response means an empty page
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the source reports another page after this one.
    pub fn has_next(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|m| m.has_next)
            .unwrap_or(false)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}
