//! Enrichment-job records as delivered by the source API.
//!
//! Records arrive as loosely typed JSON. [`EnrichmentRecord::from_payload`]
//! is the only place that maps the wire shape onto typed fields, so a single
//! malformed element never poisons the rest of a page.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Status of a job that still has to be promoted to gold.
pub const STATUS_PROCESSING: &str = "PROCESSING";

/// Status written to every promoted gold row.
pub const STATUS_DONE: &str = "CONCLUIDO";

/// Wire field names of the source API. These are also the warehouse column names.
pub mod fields {
    pub const ID: &str = "id_enriquecimento";
    pub const WORKSPACE_ID: &str = "id_workspace";
    pub const WORKSPACE_NAME: &str = "nome_workspace";
    pub const TOTAL_CONTACTS: &str = "total_contatos";
    pub const CONTACT_TYPE: &str = "tipo_contato";
    pub const PROCESSING_STATUS: &str = "status_processamento";
    pub const CREATED_AT: &str = "data_criacao";
    pub const UPDATED_AT: &str = "data_atualizacao";
}

/// One enrichment job as reported by the source API.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRecord {
    /// Natural key
    pub id: String,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
    /// Defaults to 0 when the source omits it
    pub total_contacts: i64,
    pub contact_type: Option<String>,
    pub processing_status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Original record, kept verbatim for audit and replay
    pub raw_payload: Value,
}

impl EnrichmentRecord {
    /// Extracts the typed fields from a raw API record.
    ///
    /// Fails when the payload is not an object, the natural key is absent,
    /// or a present field has a type that cannot be coerced.
    pub fn from_payload(payload: Value) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            Error::invalid_record(format!("expected a JSON object, got {}", kind(&payload)))
        })?;

        let id = natural_key(object)?;
        let workspace_id = optional_string(object, fields::WORKSPACE_ID)?;
        let workspace_name = optional_string(object, fields::WORKSPACE_NAME)?;
        let total_contacts = total_contacts(object)?;
        let contact_type = optional_string(object, fields::CONTACT_TYPE)?;
        let processing_status = optional_string(object, fields::PROCESSING_STATUS)?;
        let created_at = optional_timestamp(object, fields::CREATED_AT)?;
        let updated_at = optional_timestamp(object, fields::UPDATED_AT)?;

        Ok(Self {
            id,
            workspace_id,
            workspace_name,
            total_contacts,
            contact_type,
            processing_status,
            created_at,
            updated_at,
            raw_payload: payload,
        })
    }

    /// Whether the transform should pick this record up.
    pub fn is_processing(&self) -> bool {
        self.processing_status.as_deref() == Some(STATUS_PROCESSING)
    }
}

fn natural_key(object: &Map<String, Value>) -> Result<String> {
    match object.get(fields::ID) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(Error::missing_field(fields::ID))
        }
        Some(other) => Err(Error::invalid_record(format!(
            "{} must be a string, got {}",
            fields::ID,
            kind(other)
        ))),
    }
}

fn optional_string(object: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::invalid_record(format!(
            "{} must be a string, got {}",
            field,
            kind(other)
        ))),
    }
}

fn total_contacts(object: &Map<String, Value>) -> Result<i64> {
    let field = fields::TOTAL_CONTACTS;
    let value = match object.get(field) {
        None | Some(Value::Null) => return Ok(0),
        Some(v) => v,
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n >= 0 => Ok(n),
        _ => Err(Error::invalid_record(format!(
            "{} must be a non-negative integer, got {}",
            field, value
        ))),
    }
}

fn optional_timestamp(object: &Map<String, Value>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s).map(Some).ok_or_else(|| {
            Error::invalid_record(format!("{} is not a recognised timestamp: {}", field, s))
        }),
        Some(other) => Err(Error::invalid_record(format!(
            "{} must be a timestamp string, got {}",
            field,
            kind(other)
        ))),
    }
}

/// Offset-less forms the warehouse would also accept. They are read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // Postgres text output, e.g. `2024-01-15 10:00:00+00`
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
