use engine_core::{BronzeRow, GoldRow, SizeCategory};
use sqlx::postgres::PgRow;
use sqlx::Row;

pub(crate) const BRONZE_COLUMNS: &str = "id_enriquecimento, id_workspace, nome_workspace, \
     total_contatos, tipo_contato, status_processamento, data_criacao, data_atualizacao";

pub(crate) const GOLD_COLUMNS: &str = "id_enriquecimento, id_workspace, nome_workspace, \
     total_contatos, tipo_contato, status_processamento, data_criacao, data_atualizacao, \
     duracao_processamento_minutos, tempo_por_contato_minutos, processamento_sucesso, \
     categoria_tamanho_job, necessita_reprocessamento";

pub(crate) fn bronze_from_row(row: &PgRow) -> Result<BronzeRow, sqlx::Error> {
    Ok(BronzeRow {
        id: row.try_get("id_enriquecimento")?,
        workspace_id: row.try_get("id_workspace")?,
        workspace_name: row.try_get("nome_workspace")?,
        total_contacts: row.try_get("total_contatos")?,
        contact_type: row.try_get("tipo_contato")?,
        processing_status: row.try_get("status_processamento")?,
        created_at: row.try_get("data_criacao")?,
        updated_at: row.try_get("data_atualizacao")?,
    })
}

pub(crate) fn gold_from_row(row: &PgRow) -> Result<GoldRow, sqlx::Error> {
    let category: Option<String> = row.try_get("categoria_tamanho_job")?;
    let size_category = category
        .as_deref()
        .unwrap_or_default()
        .parse::<SizeCategory>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(GoldRow {
        id: row.try_get("id_enriquecimento")?,
        workspace_id: row.try_get("id_workspace")?,
        workspace_name: row.try_get("nome_workspace")?,
        total_contacts: row.try_get("total_contatos")?,
        contact_type: row.try_get("tipo_contato")?,
        processing_status: row
            .try_get::<Option<String>, _>("status_processamento")?
            .unwrap_or_default(),
        created_at: row.try_get("data_criacao")?,
        updated_at: row.try_get("data_atualizacao")?,
        duration_minutes: row
            .try_get::<Option<f64>, _>("duracao_processamento_minutos")?
            .unwrap_or_default(),
        minutes_per_contact: row
            .try_get::<Option<f64>, _>("tempo_por_contato_minutos")?
            .unwrap_or_default(),
        success: row
            .try_get::<Option<bool>, _>("processamento_sucesso")?
            .unwrap_or_default(),
        size_category,
        needs_reprocessing: row
            .try_get::<Option<bool>, _>("necessita_reprocessamento")?
            .unwrap_or_default(),
    })
}
