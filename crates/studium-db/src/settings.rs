//! Settings repository implementation.
//!
//! A single row holds the process-wide settings; `get_or_create` inserts
//! the default row on first access.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use studium_core::{AppSettings, Error, Result, SettingsRepository, SettingsUpdate};

const SETTINGS_COLUMNS: &str = "llm_provider, openai_api_key, openai_model, ollama_base_url, \
     ollama_model, embedding_provider, embedding_model, enable_vision_processing, \
     vision_provider, ollama_vision_model";

/// PostgreSQL implementation of SettingsRepository.
pub struct PgSettingsRepository {
    pool: Pool<Postgres>,
}

impl PgSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> AppSettings {
        AppSettings {
            llm_provider: row.get("llm_provider"),
            openai_api_key: row.get("openai_api_key"),
            openai_model: row.get("openai_model"),
            ollama_base_url: row.get("ollama_base_url"),
            ollama_model: row.get("ollama_model"),
            embedding_provider: row.get("embedding_provider"),
            embedding_model: row.get("embedding_model"),
            enable_vision_processing: row.get("enable_vision_processing"),
            vision_provider: row.get("vision_provider"),
            ollama_vision_model: row.get("ollama_vision_model"),
        }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get_or_create(&self) -> Result<AppSettings> {
        let row = sqlx::query(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM app_settings ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(row) = row {
            return Ok(Self::parse_row(row));
        }

        let row = sqlx::query(&format!(
            "INSERT INTO app_settings DEFAULT VALUES RETURNING {SETTINGS_COLUMNS}"
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn update(&self, update: SettingsUpdate) -> Result<AppSettings> {
        // Ensure the row exists, then apply the partial update in one
        // statement with COALESCE semantics per field.
        let current = self.get_or_create().await?;

        let openai_api_key = match update.openai_api_key {
            Some(value) => value,
            None => current.openai_api_key.clone(),
        };

        let row = sqlx::query(&format!(
            "UPDATE app_settings SET
                 llm_provider = COALESCE($1, llm_provider),
                 openai_api_key = $2,
                 openai_model = COALESCE($3, openai_model),
                 ollama_base_url = COALESCE($4, ollama_base_url),
                 ollama_model = COALESCE($5, ollama_model),
                 embedding_provider = COALESCE($6, embedding_provider),
                 embedding_model = COALESCE($7, embedding_model),
                 enable_vision_processing = COALESCE($8, enable_vision_processing),
                 vision_provider = COALESCE($9, vision_provider),
                 ollama_vision_model = COALESCE($10, ollama_vision_model),
                 updated_at = now()
             WHERE id = (SELECT id FROM app_settings ORDER BY id LIMIT 1)
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(&update.llm_provider)
        .bind(&openai_api_key)
        .bind(&update.openai_model)
        .bind(&update.ollama_base_url)
        .bind(&update.ollama_model)
        .bind(&update.embedding_provider)
        .bind(&update.embedding_model)
        .bind(update.enable_vision_processing)
        .bind(&update.vision_provider)
        .bind(&update.ollama_vision_model)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }
}
