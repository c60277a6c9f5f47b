//! Chunk store implementation.
//!
//! Embeddings live in one nullable pgvector column per supported dimension
//! (`embedding_384/768/1024/1536`); exactly one is non-null per row. Search
//! selects the column for the requested dimension, so a dimension mismatch
//! filters rather than errors.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument};

use studium_core::defaults::SUPPORTED_DIMENSIONS;
use studium_core::{
    ChunkHit, ChunkRepository, DocumentFingerprint, Error, NewChunk, Result, Vector,
};

/// PostgreSQL implementation of ChunkRepository.
pub struct PgChunkRepository {
    pool: Pool<Postgres>,
}

impl PgChunkRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// The embedding column for a dimension.
    fn embedding_column(dimension: usize) -> Result<&'static str> {
        match dimension {
            384 => Ok("embedding_384"),
            768 => Ok("embedding_768"),
            1024 => Ok("embedding_1024"),
            1536 => Ok("embedding_1536"),
            other => Err(Error::Config(format!(
                "unsupported embedding dimension {} (supported: {:?})",
                other, SUPPORTED_DIMENSIONS
            ))),
        }
    }
}

#[async_trait]
impl ChunkRepository for PgChunkRepository {
    #[instrument(skip(self, chunks), fields(subsystem = "db", component = "chunks", op = "replace", document_id, chunk_count = chunks.len()))]
    async fn replace_for_document(
        &self,
        document_id: i64,
        workspace_id: i64,
        chunks: Vec<NewChunk>,
        dimension: usize,
        provider: &str,
        model: &str,
    ) -> Result<()> {
        let column = Self::embedding_column(dimension)?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM document_chunk WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let insert = format!(
            "INSERT INTO document_chunk
                 (document_id, workspace_id, chunk_index, content, metadata, {column})
             VALUES ($1, $2, $3, $4, $5, $6)"
        );
        for chunk in &chunks {
            sqlx::query(&insert)
                .bind(document_id)
                .bind(workspace_id)
                .bind(chunk.ordinal)
                .bind(&chunk.content)
                .bind(&chunk.metadata)
                .bind(&chunk.embedding)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        sqlx::query(
            "UPDATE document
             SET embedding_provider = $2, embedding_model = $3,
                 status = 'completed', error_message = NULL
             WHERE id = $1",
        )
        .bind(document_id)
        .bind(provider)
        .bind(model)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(document_id, chunk_count = chunks.len(), "Chunks replaced");
        Ok(())
    }

    async fn delete_for_document(&self, document_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM document_chunk WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn count_for_document(&self, document_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM document_chunk WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    #[instrument(skip(self, query), fields(subsystem = "db", component = "chunks", op = "search", workspace_id, dimension, k))]
    async fn search(
        &self,
        workspace_id: i64,
        query: &Vector,
        dimension: usize,
        k: i64,
    ) -> Result<Vec<ChunkHit>> {
        let column = Self::embedding_column(dimension)?;

        // Cosine distance ascending == similarity descending; ties broken
        // by (document_id, chunk_index) ascending.
        let sql = format!(
            "SELECT id, document_id, workspace_id, chunk_index, content, metadata,
                    1.0 - ({column} <=> $1::vector) AS score
             FROM document_chunk
             WHERE workspace_id = $2 AND {column} IS NOT NULL
             ORDER BY {column} <=> $1::vector, document_id, chunk_index
             LIMIT $3"
        );

        let rows = sqlx::query(&sql)
            .bind(query)
            .bind(workspace_id)
            .bind(k)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let hits = rows
            .into_iter()
            .map(|row| ChunkHit {
                chunk_id: row.get("id"),
                document_id: row.get("document_id"),
                workspace_id: row.get("workspace_id"),
                ordinal: row.get("chunk_index"),
                content: row.get("content"),
                metadata: row.get("metadata"),
                score: row.get::<f64, _>("score") as f32,
            })
            .collect();

        Ok(hits)
    }

    async fn document_fingerprints(&self, workspace_id: i64) -> Result<Vec<DocumentFingerprint>> {
        let rows = sqlx::query(
            "SELECT id, title, embedding_provider, embedding_model
             FROM document
             WHERE workspace_id = $1
               AND status = 'completed'
               AND embedding_provider IS NOT NULL
               AND embedding_model IS NOT NULL
             ORDER BY id",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| DocumentFingerprint {
                document_id: row.get("id"),
                title: row.get("title"),
                provider: row.get("embedding_provider"),
                model: row.get("embedding_model"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_column_for_supported_dims() {
        assert_eq!(PgChunkRepository::embedding_column(384).unwrap(), "embedding_384");
        assert_eq!(PgChunkRepository::embedding_column(768).unwrap(), "embedding_768");
        assert_eq!(PgChunkRepository::embedding_column(1024).unwrap(), "embedding_1024");
        assert_eq!(PgChunkRepository::embedding_column(1536).unwrap(), "embedding_1536");
    }

    #[test]
    fn embedding_column_rejects_unknown_dim() {
        let err = PgChunkRepository::embedding_column(512).unwrap_err();
        assert!(err.to_string().contains("unsupported embedding dimension"));
    }
}
