//! Chat history repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use studium_core::{ChatMessage, ChatRepository, ChatRole, Error, Result};

/// PostgreSQL implementation of ChatRepository.
pub struct PgChatRepository {
    pool: Pool<Postgres>,
}

impl PgChatRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> ChatMessage {
        let role: String = row.get("role");
        ChatMessage {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            role: ChatRole::from_str_loose(&role),
            content: row.get("content"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn append(&self, workspace_id: i64, role: ChatRole, content: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO chat_message (workspace_id, role, content)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(workspace_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn history(&self, workspace_id: i64) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, workspace_id, role, content, created_at
             FROM chat_message
             WHERE workspace_id = $1
             ORDER BY id",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn window_before(
        &self,
        workspace_id: i64,
        before_id: i64,
        n: i64,
    ) -> Result<Vec<ChatMessage>> {
        // Fetch the n most recent prior messages, then restore oldest-first
        // order in the outer query.
        let rows = sqlx::query(
            "SELECT id, workspace_id, role, content, created_at FROM (
                 SELECT id, workspace_id, role, content, created_at
                 FROM chat_message
                 WHERE workspace_id = $1 AND id < $2
                 ORDER BY id DESC
                 LIMIT $3
             ) recent ORDER BY id",
        )
        .bind(workspace_id)
        .bind(before_id)
        .bind(n)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}
