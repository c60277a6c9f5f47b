//! Podcast version repository implementation.
//!
//! Versions are LRU-bounded per (workspace, topic, type): eviction deletes
//! the oldest rows first and reports their audio paths so the caller can
//! remove the files only after the rows are gone.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use studium_core::{
    CreatePodcastVersionRequest, Error, PodcastRepository, PodcastType, PodcastVersion, Result,
};

const VERSION_COLUMNS: &str = "id, workspace_id, topic, podcast_type, voice_a, voice_b, \
     voice_a_name, voice_b_name, script_artifact_id, audio_path, created_at";

/// PostgreSQL implementation of PodcastRepository.
pub struct PgPodcastRepository {
    pool: Pool<Postgres>,
}

impl PgPodcastRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> PodcastVersion {
        let podcast_type: String = row.get("podcast_type");
        PodcastVersion {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            topic: row.get("topic"),
            podcast_type: PodcastType::from_str_loose(&podcast_type).unwrap_or(PodcastType::Duo),
            voice_a: row.get("voice_a"),
            voice_b: row.get("voice_b"),
            voice_a_name: row.get("voice_a_name"),
            voice_b_name: row.get("voice_b_name"),
            script_artifact_id: row.get("script_artifact_id"),
            audio_path: row.get("audio_path"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl PodcastRepository for PgPodcastRepository {
    async fn create(&self, req: CreatePodcastVersionRequest) -> Result<PodcastVersion> {
        let row = sqlx::query(&format!(
            "INSERT INTO podcast_version
                 (workspace_id, topic, podcast_type, voice_a, voice_b,
                  voice_a_name, voice_b_name, script_artifact_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {VERSION_COLUMNS}"
        ))
        .bind(req.workspace_id)
        .bind(&req.topic)
        .bind(req.podcast_type.as_str())
        .bind(&req.voice_a)
        .bind(&req.voice_b)
        .bind(&req.voice_a_name)
        .bind(&req.voice_b_name)
        .bind(req.script_artifact_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn get(&self, id: i64) -> Result<PodcastVersion> {
        let row = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM podcast_version WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row)
            .ok_or_else(|| Error::NotFound(format!("podcast version {}", id)))
    }

    async fn list(
        &self,
        workspace_id: i64,
        topic: &str,
        podcast_type: PodcastType,
    ) -> Result<Vec<PodcastVersion>> {
        let rows = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM podcast_version
             WHERE workspace_id = $1 AND topic = $2 AND podcast_type = $3
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(workspace_id)
        .bind(topic)
        .bind(podcast_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn evict_oldest(
        &self,
        workspace_id: i64,
        topic: &str,
        podcast_type: PodcastType,
        max_versions: i64,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "DELETE FROM podcast_version
             WHERE id IN (
                 SELECT id FROM podcast_version
                 WHERE workspace_id = $1 AND topic = $2 AND podcast_type = $3
                 ORDER BY created_at DESC, id DESC
                 OFFSET $4
             )
             RETURNING audio_path",
        )
        .bind(workspace_id)
        .bind(topic)
        .bind(podcast_type.as_str())
        .bind(max_versions)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let evicted: Vec<String> = rows
            .into_iter()
            .filter_map(|row| row.get::<Option<String>, _>("audio_path"))
            .collect();
        if !evicted.is_empty() {
            debug!(
                workspace_id,
                topic,
                evicted = evicted.len(),
                "Evicted podcast versions beyond cap"
            );
        }
        Ok(evicted)
    }

    async fn set_audio_path(&self, id: i64, audio_path: &str) -> Result<()> {
        let result = sqlx::query("UPDATE podcast_version SET audio_path = $2 WHERE id = $1")
            .bind(id)
            .bind(audio_path)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("podcast version {}", id)));
        }
        Ok(())
    }

    async fn update_voices(
        &self,
        id: i64,
        voice_a: &str,
        voice_b: Option<&str>,
        voice_a_name: &str,
        voice_b_name: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE podcast_version
             SET voice_a = $2, voice_b = $3, voice_a_name = $4, voice_b_name = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(voice_a)
        .bind(voice_b)
        .bind(voice_a_name)
        .bind(voice_b_name)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("podcast version {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<Option<String>> {
        let row = sqlx::query("DELETE FROM podcast_version WHERE id = $1 RETURNING audio_path")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(row.get("audio_path")),
            None => Err(Error::NotFound(format!("podcast version {}", id))),
        }
    }

    async fn all_audio_paths(&self) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT audio_path FROM podcast_version WHERE audio_path IS NOT NULL")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.get::<Option<String>, _>("audio_path"))
            .collect())
    }
}
