//! Artifact store implementation.
//!
//! Artifacts are upserted on `(workspace_id, topic, kind)` backed by the
//! partial unique index; `podcast_script` is excluded from that index and
//! always inserts a new row (versioned).

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};

use studium_core::{Artifact, ArtifactKind, ArtifactRepository, Error, Result};

/// PostgreSQL implementation of ArtifactRepository.
pub struct PgArtifactRepository {
    pool: Pool<Postgres>,
}

impl PgArtifactRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Artifact {
        let kind: String = row.get("kind");
        Artifact {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            topic: row.get("topic"),
            kind: ArtifactKind::from_str_loose(&kind).unwrap_or(ArtifactKind::Lesson),
            payload: row.get("payload"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl ArtifactRepository for PgArtifactRepository {
    async fn upsert(
        &self,
        workspace_id: i64,
        topic: &str,
        kind: ArtifactKind,
        payload: &JsonValue,
    ) -> Result<Artifact> {
        let row = if kind == ArtifactKind::PodcastScript {
            sqlx::query(
                "INSERT INTO artifact (workspace_id, topic, kind, payload)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, workspace_id, topic, kind, payload, created_at",
            )
            .bind(workspace_id)
            .bind(topic)
            .bind(kind.as_str())
            .bind(payload)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
        } else {
            sqlx::query(
                "INSERT INTO artifact (workspace_id, topic, kind, payload)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (workspace_id, topic, kind) WHERE kind <> 'podcast_script'
                 DO UPDATE SET payload = EXCLUDED.payload
                 RETURNING id, workspace_id, topic, kind, payload, created_at",
            )
            .bind(workspace_id)
            .bind(topic)
            .bind(kind.as_str())
            .bind(payload)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
        };

        Ok(Self::parse_row(row))
    }

    async fn get(
        &self,
        workspace_id: i64,
        topic: &str,
        kind: ArtifactKind,
    ) -> Result<Option<Artifact>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, topic, kind, payload, created_at
             FROM artifact
             WHERE workspace_id = $1 AND topic = $2 AND kind = $3
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(workspace_id)
        .bind(topic)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn get_by_id(&self, id: i64) -> Result<Artifact> {
        let row = sqlx::query(
            "SELECT id, workspace_id, topic, kind, payload, created_at
             FROM artifact WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row)
            .ok_or_else(|| Error::NotFound(format!("artifact {}", id)))
    }

    async fn update_payload(&self, id: i64, payload: &JsonValue) -> Result<()> {
        let result = sqlx::query("UPDATE artifact SET payload = $2 WHERE id = $1")
            .bind(id)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("artifact {}", id)));
        }
        Ok(())
    }

    async fn get_existing(&self, workspace_id: i64, topic: &str) -> Result<Vec<Artifact>> {
        // Most recent row per kind (only podcast_script can have several).
        let rows = sqlx::query(
            "SELECT DISTINCT ON (kind)
                    id, workspace_id, topic, kind, payload, created_at
             FROM artifact
             WHERE workspace_id = $1 AND topic = $2
             ORDER BY kind, id DESC",
        )
        .bind(workspace_id)
        .bind(topic)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}
