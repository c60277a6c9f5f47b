//! Workspace repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use studium_core::{Error, Result, Workspace, WorkspaceRepository};

/// PostgreSQL implementation of WorkspaceRepository.
pub struct PgWorkspaceRepository {
    pool: Pool<Postgres>,
}

impl PgWorkspaceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Workspace {
        Workspace {
            id: row.get("id"),
            name: row.get("name"),
            llm_provider: row.get("llm_provider"),
            llm_model: row.get("llm_model"),
            embedding_provider: row.get("embedding_provider"),
            embedding_model: row.get("embedding_model"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl WorkspaceRepository for PgWorkspaceRepository {
    async fn create(&self, name: &str) -> Result<Workspace> {
        let row = sqlx::query(
            "INSERT INTO workspace (name)
             VALUES ($1)
             RETURNING id, name, llm_provider, llm_model,
                       embedding_provider, embedding_model, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn get(&self, id: i64) -> Result<Workspace> {
        let row = sqlx::query(
            "SELECT id, name, llm_provider, llm_model,
                    embedding_provider, embedding_model, created_at
             FROM workspace WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row)
            .ok_or(Error::WorkspaceNotFound(id))
    }

    async fn list(&self) -> Result<Vec<Workspace>> {
        let rows = sqlx::query(
            "SELECT id, name, llm_provider, llm_model,
                    embedding_provider, embedding_model, created_at
             FROM workspace ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}
