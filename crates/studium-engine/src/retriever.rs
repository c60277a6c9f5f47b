//! Workspace-scoped semantic retrieval with compatibility enforcement.
//!
//! Vector distances are meaningless across embedding models, so a
//! workspace mixing fingerprints is refused outright rather than returning
//! silently degraded results.

use std::sync::Arc;

use tracing::{debug, instrument};

use studium_core::{
    ChunkHit, ChunkRepository, EffectiveConfig, EmbeddingBackend, Error, Result,
    SettingsRepository, WorkspaceRepository,
};
use studium_db::Database;
use studium_inference::BackendSelector;

/// Retrieval entry point shared by chat and the generators.
pub struct Retriever {
    db: Database,
    selector: Arc<BackendSelector>,
}

impl Retriever {
    pub fn new(db: Database, selector: Arc<BackendSelector>) -> Self {
        Self { db, selector }
    }

    /// Retrieve the top-k chunks in the workspace for a query.
    ///
    /// Refuses with `NotFound` when the workspace has no completed
    /// documents, and with `IncompatibleEmbeddings` when any completed
    /// document was embedded under a different fingerprint than the
    /// effective configuration.
    #[instrument(skip(self, query), fields(subsystem = "engine", component = "retriever", workspace_id, k))]
    pub async fn retrieve(&self, workspace_id: i64, query: &str, k: i64) -> Result<Vec<ChunkHit>> {
        let workspace = self.db.workspaces.get(workspace_id).await?;
        let settings = self.db.settings.get_or_create().await?;
        let cfg = EffectiveConfig::resolve(&workspace, &settings);
        cfg.require_embeddings()?;

        let fingerprints = self.db.chunks.document_fingerprints(workspace_id).await?;
        if fingerprints.is_empty() {
            return Err(Error::NotFound(
                "no completed documents in workspace".into(),
            ));
        }

        let (provider, model) = cfg.embedding_fingerprint();
        let mismatched: Vec<String> = fingerprints
            .iter()
            .filter(|f| f.provider != provider || f.model != model)
            .map(|f| format!("{} ({}/{})", f.title, f.provider, f.model))
            .collect();
        if !mismatched.is_empty() {
            return Err(Error::IncompatibleEmbeddings {
                message: format!(
                    "workspace documents were embedded with a different model than the \
                     active {}/{}; reprocess them or switch the embedding settings",
                    provider, model
                ),
                documents: mismatched,
            });
        }

        let embedder = self.selector.embeddings(&cfg).await?;
        let query_vec = embedder
            .embed_texts(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("embedding backend returned no vector".into()))?;

        let hits = self
            .db
            .chunks
            .search(workspace_id, &query_vec, embedder.dimension(), k)
            .await?;

        debug!(result_count = hits.len(), "Retrieval complete");
        Ok(hits)
    }
}

/// Join retrieved chunks into a labeled context block for prompting.
pub fn context_block(hits: &[ChunkHit]) -> String {
    hits.iter()
        .map(|h| h.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_block_joins_contents() {
        let hit = |content: &str| ChunkHit {
            chunk_id: 1,
            document_id: 1,
            workspace_id: 1,
            ordinal: 0,
            content: content.to_string(),
            metadata: json!({}),
            score: 0.9,
        };
        let block = context_block(&[hit("first"), hit("second")]);
        assert_eq!(block, "first\n\nsecond");
    }

    #[test]
    fn context_block_empty() {
        assert_eq!(context_block(&[]), "");
    }
}
