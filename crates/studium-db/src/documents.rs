//! Document repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use studium_core::{
    CreateDocumentRequest, Document, DocumentRepository, DocumentStatus, Error, FileType, Result,
};

const DOCUMENT_COLUMNS: &str = "id, workspace_id, title, file_type, file_path, status, \
     error_message, embedding_provider, embedding_model, created_at";

/// PostgreSQL implementation of DocumentRepository.
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub(crate) fn parse_row(row: sqlx::postgres::PgRow) -> Document {
        let file_type: String = row.get("file_type");
        let status: String = row.get("status");
        Document {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            title: row.get("title"),
            file_type: FileType::from_str_loose(&file_type).unwrap_or(FileType::Pdf),
            file_path: row.get("file_path"),
            status: DocumentStatus::from_str_loose(&status),
            error_message: row.get("error_message"),
            embedding_provider: row.get("embedding_provider"),
            embedding_model: row.get("embedding_model"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Document> {
        let row = sqlx::query(&format!(
            "INSERT INTO document (workspace_id, title, file_type, file_path, status)
             VALUES ($1, $2, $3, $4, 'pending')
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(req.workspace_id)
        .bind(&req.title)
        .bind(req.file_type.as_str())
        .bind(&req.file_path)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn get(&self, id: i64) -> Result<Document> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_row).ok_or(Error::DocumentNotFound(id))
    }

    async fn list_for_workspace(&self, workspace_id: i64) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document
             WHERE workspace_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn set_status(&self, id: i64, status: DocumentStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE document SET status = $2, error_message = NULL WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn set_failed(&self, id: i64, error_message: &str) -> Result<()> {
        sqlx::query("UPDATE document SET status = 'failed', error_message = $2 WHERE id = $1")
            .bind(id)
            .bind(error_message)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM document WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }
}
