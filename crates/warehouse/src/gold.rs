//! Transform engine: promotes PROCESSING bronze rows to gold.

use crate::client::WarehouseClient;
use crate::rows::{bronze_from_row, BRONZE_COLUMNS};
use engine_core::{GoldRow, Result, TransformErrorCode, STATUS_DONE, STATUS_PROCESSING};
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, info};

/// Rows per multi-row INSERT. 13 binds per row keeps a chunk far below
/// the 65535 bind-parameter limit.
pub const UPSERT_CHUNK_SIZE: usize = 1000;

/// Outcome of one transform pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromoteSummary {
    /// Bronze rows selected for promotion
    pub selected: usize,
    /// Gold rows inserted or updated
    pub upserted: u64,
}

/// Runs one transform pass.
///
/// Returns `true` on success (including a pass with nothing to promote).
/// Any store failure rolls the pass back and yields `false`.
pub async fn promote_bronze_to_gold(client: &WarehouseClient) -> bool {
    let start = Instant::now();
    let m = metrics();
    m.transform_runs.inc();

    match try_promote(client).await {
        Ok(summary) => {
            m.gold_rows_upserted.inc_by(summary.upserted);
            m.processing_rows_scanned.set(summary.selected as u64);
            m.transform_latency_ms.observe(start.elapsed().as_millis() as u64);
            info!(
                selected = summary.selected,
                upserted = summary.upserted,
                "Gold transform complete"
            );
            true
        }
        Err(e) => {
            m.transform_failures.inc();
            error!(
                code = e.error_code().unwrap_or_default(),
                "Gold transform failed: {}",
                e
            );
            false
        }
    }
}

/// Selects, derives and upserts inside a single transaction.
pub async fn try_promote(client: &WarehouseClient) -> Result<PromoteSummary> {
    let mut tx = client.pool().begin().await.map_err(|e| {
        engine_core::Error::transform(
            TransformErrorCode::StoreUnavailable,
            format!("failed to open transaction: {}", e),
        )
    })?;

    let sql = format!(
        "SELECT {} FROM bronze_enriquecimentos WHERE status_processamento = $1",
        BRONZE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(STATUS_PROCESSING)
        .fetch_all(&mut *tx)
        .await
        .map_err(query_failed)?;

    let gold: Vec<GoldRow> = rows
        .iter()
        .map(bronze_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(query_failed)?
        .iter()
        .map(GoldRow::derive)
        .collect();

    debug!(selected = gold.len(), "Derived gold rows");

    let mut upserted = 0;
    for chunk in gold.chunks(UPSERT_CHUNK_SIZE) {
        upserted += upsert_chunk(&mut tx, chunk).await?;
    }

    tx.commit().await.map_err(|e| {
        engine_core::Error::transform(
            TransformErrorCode::StoreUnavailable,
            format!("failed to commit transform: {}", e),
        )
    })?;

    Ok(PromoteSummary {
        selected: gold.len(),
        upserted,
    })
}

async fn upsert_chunk(tx: &mut Transaction<'static, Postgres>, rows: &[GoldRow]) -> Result<u64> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO gold_enriquecimentos (\
         id_enriquecimento, id_workspace, nome_workspace, total_contatos, tipo_contato, \
         status_processamento, data_criacao, data_atualizacao, \
         duracao_processamento_minutos, tempo_por_contato_minutos, processamento_sucesso, \
         categoria_tamanho_job, necessita_reprocessamento) ",
    );

    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id.clone())
            .push_bind(row.workspace_id.clone())
            .push_bind(row.workspace_name.clone())
            .push_bind(row.total_contacts)
            .push_bind(row.contact_type.clone())
            .push_bind(row.processing_status.clone())
            .push_bind(row.created_at)
            .push_bind(row.updated_at)
            .push_bind(row.duration_minutes)
            .push_bind(row.minutes_per_contact)
            .push_bind(row.success)
            .push_bind(row.size_category.as_str())
            .push_bind(row.needs_reprocessing);
    });

    builder.push(" ON CONFLICT (id_enriquecimento) DO UPDATE SET status_processamento = ");
    builder.push_bind(STATUS_DONE);

    let done = builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(query_failed)?;

    Ok(done.rows_affected())
}

fn query_failed(e: sqlx::Error) -> engine_core::Error {
    engine_core::Error::transform(TransformErrorCode::QueryFailed, e.to_string())
}
