//! Task queue repository implementation.
//!
//! A DB-backed FIFO queue with at-least-once delivery. Enqueue is
//! deduplicated per `(kind, entity_id)` with an atomic
//! `INSERT … WHERE NOT EXISTS`; claiming uses `FOR UPDATE SKIP LOCKED` so
//! multiple worker processes can poll the same table. Cancellation is a
//! cooperative flag the running task polls between phases.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};

use studium_core::{Error, Result, Task, TaskKind, TaskRepository, TaskStatus};

const TASK_COLUMNS: &str = "id, kind, entity_id, status, payload, error_message, \
     progress_percent, progress_message, cancel_requested, created_at, started_at, completed_at";

/// PostgreSQL implementation of TaskRepository.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
}

impl PgTaskRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Task {
        let kind: String = row.get("kind");
        let status: String = row.get("status");
        Task {
            id: row.get("id"),
            kind: TaskKind::from_str_loose(&kind).unwrap_or(TaskKind::Ingest),
            entity_id: row.get("entity_id"),
            status: TaskStatus::from_str_loose(&status),
            payload: row.get("payload"),
            error_message: row.get("error_message"),
            progress_percent: row.get("progress_percent"),
            progress_message: row.get("progress_message"),
            cancel_requested: row.get("cancel_requested"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn enqueue(
        &self,
        kind: TaskKind,
        entity_id: i64,
        payload: Option<JsonValue>,
    ) -> Result<Option<i64>> {
        // Atomic check-and-insert: submitting while a task for the same
        // entity is pending/running is a no-op.
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO task_queue (kind, entity_id, payload)
             SELECT $1, $2, $3
             WHERE NOT EXISTS (
                 SELECT 1 FROM task_queue
                 WHERE kind = $1 AND entity_id = $2
                   AND status IN ('pending', 'running')
             )
             RETURNING id",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(&payload)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn claim_next(&self, kinds: &[TaskKind]) -> Result<Option<Task>> {
        let kind_strings: Vec<String> =
            kinds.iter().map(|k| k.as_str().to_string()).collect();

        let row = sqlx::query(&format!(
            "UPDATE task_queue
             SET status = 'running', started_at = $1
             WHERE id = (
                 SELECT id FROM task_queue
                 WHERE status = 'pending'
                   AND (cardinality($2::text[]) = 0 OR kind = ANY($2))
                 ORDER BY created_at, id
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(&kind_strings)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn update_progress(
        &self,
        task_id: i64,
        percent: i32,
        message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE task_queue
             SET progress_percent = $2, progress_message = $3
             WHERE id = $1",
        )
        .bind(task_id)
        .bind(percent.clamp(0, 100))
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn complete(&self, task_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE task_queue
             SET status = 'completed', progress_percent = 100, completed_at = $2
             WHERE id = $1",
        )
        .bind(task_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, task_id: i64, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE task_queue
             SET status = 'failed', error_message = $2, completed_at = $3
             WHERE id = $1",
        )
        .bind(task_id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn request_cancel(&self, kind: TaskKind, entity_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE task_queue
             SET cancel_requested = TRUE
             WHERE kind = $1 AND entity_id = $2
               AND status IN ('pending', 'running')",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn cancel_requested(&self, task_id: i64) -> Result<bool> {
        let flag: Option<bool> =
            sqlx::query_scalar("SELECT cancel_requested FROM task_queue WHERE id = $1")
                .bind(task_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(flag.unwrap_or(false))
    }

    async fn get(&self, task_id: i64) -> Result<Option<Task>> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM task_queue WHERE id = $1"
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }
}
