//! Test fixtures and record generators.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use source_client::{Page, PageMeta};
use uuid::Uuid;

/// A unique natural key with a readable prefix.
pub fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// A complete source record.
pub fn enrichment(id: &str, total_contacts: i64, status: &str) -> Value {
    let created = Utc::now() - Duration::minutes(30);
    json!({
        "id_enriquecimento": id,
        "id_workspace": "WS001",
        "nome_workspace": "Workspace Alpha",
        "total_contatos": total_contacts,
        "tipo_contato": "PERSON",
        "status_processamento": status,
        "data_criacao": created.to_rfc3339(),
        "data_atualizacao": Utc::now().to_rfc3339(),
    })
}

/// A record still being processed upstream.
pub fn processing(id: &str, total_contacts: i64) -> Value {
    enrichment(id, total_contacts, "PROCESSING")
}

/// A record without `total_contatos`.
pub fn without_total(id: &str) -> Value {
    json!({
        "id_enriquecimento": id,
        "id_workspace": "WS003",
        "status_processamento": "PROCESSING",
    })
}

/// A record the bronze writer must reject.
pub fn malformed() -> Value {
    json!({ "id_workspace": "WS404", "total_contatos": "lots" })
}

/// N processing records with unique ids.
pub fn processing_batch(prefix: &str, n: usize, total_contacts: i64) -> Vec<Value> {
    (0..n)
        .map(|_| processing(&unique_id(prefix), total_contacts))
        .collect()
}

/// A decoded page as the fetcher would return it.
pub fn page(data: Vec<Value>, has_next: bool) -> Page {
    Page {
        meta: Some(PageMeta {
            page: Some(1),
            limit: Some(data.len() as u32),
            has_next: Some(has_next),
            ..PageMeta::default()
        }),
        data,
    }
}

/// The JSON envelope served by the source API.
pub fn envelope(data: Vec<Value>, page: u32, limit: u32, has_next: bool) -> Value {
    json!({
        "meta": {
            "page": page,
            "limit": limit,
            "total_items": data.len(),
            "total_pages": if has_next { page + 1 } else { page },
            "has_next": has_next,
            "has_previous": page > 1,
        },
        "data": data,
    })
}
