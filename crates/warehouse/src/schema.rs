//! Warehouse table schemas.
//!
//! Column names keep the source system's wire names so a bronze row can be
//! checked against its payload without a mapping table.

use crate::client::WarehouseClient;
use engine_core::{Error, Result};
use tracing::{debug, info};

pub const BRONZE_TABLE: &str = "bronze_enriquecimentos";
pub const GOLD_TABLE: &str = "gold_enriquecimentos";

/// Raw landing tier, one row per natural key.
pub const CREATE_BRONZE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bronze_enriquecimentos (
    id_enriquecimento TEXT PRIMARY KEY,
    id_workspace TEXT,
    nome_workspace TEXT,
    total_contatos BIGINT NOT NULL DEFAULT 0,
    tipo_contato TEXT,
    status_processamento TEXT,
    data_criacao TIMESTAMPTZ,
    data_atualizacao TIMESTAMPTZ,
    payload_original JSONB NOT NULL,
    data_ingestao TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Index backing the transform's PROCESSING scan.
pub const CREATE_BRONZE_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_bronze_enriquecimentos_status
    ON bronze_enriquecimentos (status_processamento)
"#;

/// Derived tier with computed business metrics.
pub const CREATE_GOLD_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS gold_enriquecimentos (
    id_enriquecimento TEXT PRIMARY KEY,
    id_workspace TEXT,
    nome_workspace TEXT,
    total_contatos BIGINT NOT NULL DEFAULT 0,
    tipo_contato TEXT,
    status_processamento TEXT,
    data_criacao TIMESTAMPTZ,
    data_atualizacao TIMESTAMPTZ,
    duracao_processamento_minutos DOUBLE PRECISION,
    tempo_por_contato_minutos DOUBLE PRECISION,
    processamento_sucesso BOOLEAN,
    categoria_tamanho_job TEXT,
    necessita_reprocessamento BOOLEAN,
    data_atualizacao_dw TIMESTAMPTZ DEFAULT now()
)
"#;

pub const CREATE_GOLD_CATEGORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_gold_enriquecimentos_categoria
    ON gold_enriquecimentos (categoria_tamanho_job)
"#;

/// All DDL statements in execution order.
pub fn all_tables() -> Vec<&'static str> {
    vec![
        CREATE_BRONZE_TABLE,
        CREATE_BRONZE_STATUS_INDEX,
        CREATE_GOLD_TABLE,
        CREATE_GOLD_CATEGORY_INDEX,
    ]
}

/// Creates both tiers if they do not exist yet.
pub async fn init_schema(client: &WarehouseClient) -> Result<()> {
    for ddl in all_tables() {
        sqlx::query(ddl)
            .execute(client.pool())
            .await
            .map_err(|e| Error::internal(format!("failed to execute DDL: {}", e)))?;
    }

    debug!(statements = all_tables().len(), "Executed warehouse DDL");
    info!(bronze = BRONZE_TABLE, gold = GOLD_TABLE, "Warehouse schema initialized");
    Ok(())
}
