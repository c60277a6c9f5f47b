//! # studium-db
//!
//! PostgreSQL database layer for studium.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - Vector search with pgvector (one column per supported dimension)
//! - The DB-backed task queue driving the ingestion worker
//! - Text chunking strategies for the ingestion pipeline

pub mod artifacts;
pub mod chat;
pub mod chunking;
pub mod chunks;
pub mod documents;
pub mod podcasts;
pub mod pool;
pub mod settings;
pub mod tasks;
pub mod workspaces;

// Re-export core types
pub use studium_core::*;

pub use artifacts::PgArtifactRepository;
pub use chat::PgChatRepository;
pub use chunking::{Chunker, ChunkerConfig, RecursiveChunker};
pub use chunks::PgChunkRepository;
pub use documents::PgDocumentRepository;
pub use podcasts::PgPodcastRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use settings::PgSettingsRepository;
pub use tasks::PgTaskRepository;
pub use workspaces::PgWorkspaceRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub workspaces: PgWorkspaceRepository,
    pub documents: PgDocumentRepository,
    pub chunks: PgChunkRepository,
    pub chat: PgChatRepository,
    pub artifacts: PgArtifactRepository,
    pub podcasts: PgPodcastRepository,
    pub settings: PgSettingsRepository,
    pub tasks: PgTaskRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            workspaces: PgWorkspaceRepository::new(pool.clone()),
            documents: PgDocumentRepository::new(pool.clone()),
            chunks: PgChunkRepository::new(pool.clone()),
            chat: PgChatRepository::new(pool.clone()),
            artifacts: PgArtifactRepository::new(pool.clone()),
            podcasts: PgPodcastRepository::new(pool.clone()),
            settings: PgSettingsRepository::new(pool.clone()),
            tasks: PgTaskRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
