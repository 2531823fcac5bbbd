//! Read-back queries (used in tests and for operator checks).

use crate::client::WarehouseClient;
use crate::rows::{bronze_from_row, gold_from_row, BRONZE_COLUMNS, GOLD_COLUMNS};
use chrono::{DateTime, Utc};
use engine_core::{BronzeRow, Error, GoldRow, Result};
use serde_json::Value;
use sqlx::Row;

/// A bronze row together with its audit columns.
#[derive(Debug, Clone)]
pub struct StoredBronze {
    pub row: BronzeRow,
    pub payload: Value,
    pub ingested_at: DateTime<Utc>,
}

fn query_error(e: sqlx::Error) -> Error {
    Error::internal(format!("Query error: {}", e))
}

/// Count bronze rows.
pub async fn count_bronze(client: &WarehouseClient) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM bronze_enriquecimentos")
        .fetch_one(client.pool())
        .await
        .map_err(query_error)
}

/// Count gold rows.
pub async fn count_gold(client: &WarehouseClient) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM gold_enriquecimentos")
        .fetch_one(client.pool())
        .await
        .map_err(query_error)
}

/// Fetch one bronze row by natural key.
pub async fn fetch_bronze_row(client: &WarehouseClient, id: &str) -> Result<Option<StoredBronze>> {
    let sql = format!(
        "SELECT {}, payload_original, data_ingestao FROM bronze_enriquecimentos \
         WHERE id_enriquecimento = $1",
        BRONZE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(client.pool())
        .await
        .map_err(query_error)?;

    row.map(|row| -> std::result::Result<StoredBronze, sqlx::Error> {
        Ok(StoredBronze {
            row: bronze_from_row(&row)?,
            payload: row.try_get("payload_original")?,
            ingested_at: row.try_get("data_ingestao")?,
        })
    })
    .transpose()
    .map_err(query_error)
}

/// Fetch one gold row by natural key.
pub async fn fetch_gold_row(client: &WarehouseClient, id: &str) -> Result<Option<GoldRow>> {
    let sql = format!(
        "SELECT {} FROM gold_enriquecimentos WHERE id_enriquecimento = $1",
        GOLD_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(client.pool())
        .await
        .map_err(query_error)?;

    row.as_ref().map(gold_from_row).transpose().map_err(query_error)
}

/// Gold row counts per size category, largest first.
pub async fn category_distribution(client: &WarehouseClient) -> Result<Vec<(String, i64)>> {
    distribution(client, "categoria_tamanho_job").await
}

/// Gold row counts per processing status, largest first.
pub async fn status_distribution(client: &WarehouseClient) -> Result<Vec<(String, i64)>> {
    distribution(client, "status_processamento").await
}

async fn distribution(client: &WarehouseClient, column: &str) -> Result<Vec<(String, i64)>> {
    let sql = format!(
        "SELECT COALESCE({col}, '') AS key, count(*) AS total FROM gold_enriquecimentos \
         GROUP BY 1 ORDER BY total DESC, key",
        col = column
    );
    let rows = sqlx::query(&sql)
        .fetch_all(client.pool())
        .await
        .map_err(query_error)?;

    rows.iter()
        .map(|row| Ok((row.try_get::<String, _>("key")?, row.try_get::<i64, _>("total")?)))
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
        .map_err(query_error)
}

/// Truncate both tiers (test cleanup).
pub async fn truncate_all(client: &WarehouseClient) -> Result<()> {
    sqlx::query("TRUNCATE TABLE bronze_enriquecimentos, gold_enriquecimentos")
        .execute(client.pool())
        .await
        .map_err(|e| Error::internal(format!("Truncate error: {}", e)))?;
    Ok(())
}
