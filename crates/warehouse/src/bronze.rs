//! Bronze writer: lands raw records idempotently.

use crate::client::WarehouseClient;
use engine_core::{EnrichmentRecord, Error, Result, WriteErrorCode};
use serde_json::Value;
use sqlx::{Postgres, Transaction};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, info, warn};

const INSERT_BRONZE: &str = r#"
INSERT INTO bronze_enriquecimentos (
    id_enriquecimento, id_workspace, nome_workspace, total_contatos,
    tipo_contato, status_processamento, data_criacao, data_atualizacao,
    payload_original
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
ON CONFLICT (id_enriquecimento) DO NOTHING
"#;

/// Outcome of one bronze batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BronzeSummary {
    /// Insert statements that executed without error
    pub attempted: usize,
    /// Rows that actually landed (new natural keys)
    pub landed: usize,
    /// Records rejected before reaching the store
    pub rejected: usize,
    /// Rows the store refused
    pub failed: usize,
}

/// Writes a page of raw records to bronze.
///
/// Returns the number of insert statements that executed without error.
/// Conflicting keys count as attempts even though nothing lands; the landed
/// count is only logged and recorded in metrics. Store unavailability is
/// logged and yields 0.
pub async fn write_bronze(client: &WarehouseClient, records: &[Value]) -> usize {
    if records.is_empty() {
        debug!("No records to write to bronze");
        return 0;
    }

    let start = Instant::now();
    let m = metrics();

    match try_write_bronze(client, records).await {
        Ok(summary) => {
            m.bronze_attempted.inc_by(summary.attempted as u64);
            m.bronze_landed.inc_by(summary.landed as u64);
            m.bronze_rejected.inc_by(summary.rejected as u64);
            m.bronze_write_errors.inc_by(summary.failed as u64);
            m.bronze_latency_ms.observe(start.elapsed().as_millis() as u64);

            info!(
                received = records.len(),
                attempted = summary.attempted,
                landed = summary.landed,
                rejected = summary.rejected,
                failed = summary.failed,
                "Bronze batch written"
            );
            summary.attempted
        }
        Err(e) => {
            m.bronze_write_errors.inc();
            error!(
                code = e.error_code().unwrap_or_default(),
                records = records.len(),
                "Bronze batch aborted: {}",
                e
            );
            0
        }
    }
}

/// Runs the batch in one transaction, isolating each row with a savepoint.
pub async fn try_write_bronze(
    client: &WarehouseClient,
    records: &[Value],
) -> Result<BronzeSummary> {
    let mut tx = client.pool().begin().await.map_err(|e| {
        Error::write(
            WriteErrorCode::StoreUnavailable,
            format!("failed to open transaction: {}", e),
        )
    })?;

    let mut summary = BronzeSummary::default();

    for payload in records {
        let record = match EnrichmentRecord::from_payload(payload.clone()) {
            Ok(record) => record,
            Err(e) => {
                summary.rejected += 1;
                warn!(
                    code = WriteErrorCode::MalformedRecord.code(),
                    "Skipping malformed record: {}",
                    e
                );
                continue;
            }
        };

        match insert_row(&mut tx, &record).await? {
            Some(landed) => {
                summary.attempted += 1;
                if landed {
                    summary.landed += 1;
                }
            }
            None => summary.failed += 1,
        }
    }

    tx.commit().await.map_err(|e| {
        Error::write(
            WriteErrorCode::StoreUnavailable,
            format!("failed to commit bronze batch: {}", e),
        )
    })?;

    Ok(summary)
}

/// Inserts one record under a savepoint.
///
/// `Ok(Some(landed))` when the statement ran, `Ok(None)` when the store
/// refused the row and it was rolled back alone. `Err` means the
/// transaction itself is no longer usable.
async fn insert_row(
    tx: &mut Transaction<'static, Postgres>,
    record: &EnrichmentRecord,
) -> Result<Option<bool>> {
    sqlx::query("SAVEPOINT bronze_row")
        .execute(&mut **tx)
        .await
        .map_err(store_unavailable)?;

    let result = sqlx::query(INSERT_BRONZE)
        .bind(&record.id)
        .bind(&record.workspace_id)
        .bind(&record.workspace_name)
        .bind(record.total_contacts)
        .bind(&record.contact_type)
        .bind(&record.processing_status)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(&record.raw_payload)
        .execute(&mut **tx)
        .await;

    match result {
        Ok(done) => {
            sqlx::query("RELEASE SAVEPOINT bronze_row")
                .execute(&mut **tx)
                .await
                .map_err(store_unavailable)?;
            Ok(Some(done.rows_affected() == 1))
        }
        Err(e) => {
            warn!(
                code = WriteErrorCode::InsertFailed.code(),
                id = %record.id,
                "Bronze insert failed: {}",
                e
            );
            sqlx::query("ROLLBACK TO SAVEPOINT bronze_row")
                .execute(&mut **tx)
                .await
                .map_err(store_unavailable)?;
            Ok(None)
        }
    }
}

fn store_unavailable(e: sqlx::Error) -> Error {
    Error::write(
        WriteErrorCode::StoreUnavailable,
        format!("bronze transaction lost: {}", e),
    )
}
