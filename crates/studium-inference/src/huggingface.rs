//! Local HuggingFace embeddings via fastembed (ONNX runtime).

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;
use tracing::{debug, info};

use studium_core::{EmbeddingBackend, Error, Result, Vector};

use crate::embedding_models::embedding_dimension;

/// Map a sentence-transformers model name to a fastembed model.
fn model_enum(name: &str) -> Result<EmbeddingModel> {
    let short = name.strip_prefix("sentence-transformers/").unwrap_or(name);
    match (name, short) {
        (_, "all-MiniLM-L6-v2") => Ok(EmbeddingModel::AllMiniLML6V2),
        (_, "all-MiniLM-L12-v2") => Ok(EmbeddingModel::AllMiniLML12V2),
        (_, "all-mpnet-base-v2") => Ok(EmbeddingModel::ParaphraseMLMpnetBaseV2),
        ("BAAI/bge-small-en-v1.5", _) => Ok(EmbeddingModel::BGESmallENV15),
        ("BAAI/bge-base-en-v1.5", _) => Ok(EmbeddingModel::BGEBaseENV15),
        ("BAAI/bge-large-en-v1.5", _) => Ok(EmbeddingModel::BGELargeENV15),
        ("nomic-ai/nomic-embed-text-v1.5", _) => Ok(EmbeddingModel::NomicEmbedTextV15),
        ("mixedbread-ai/mxbai-embed-large-v1", _) => Ok(EmbeddingModel::MxbaiEmbedLargeV1),
        _ => Err(Error::Config(format!(
            "unsupported huggingface embedding model: {}",
            name
        ))),
    }
}

/// Local embedding backend. Model weights are fetched on first
/// initialization; inference runs on a blocking thread.
pub struct HuggingFaceEmbeddingBackend {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl HuggingFaceEmbeddingBackend {
    /// Load (downloading if needed) the named model. Blocking; call from a
    /// blocking context or wrap in `spawn_blocking`.
    pub fn load(model_name: &str) -> Result<Self> {
        let dimension = embedding_dimension("huggingface", model_name)?;
        let model_id = model_enum(model_name)?;

        info!(model = model_name, dimension, "Loading local embedding model");
        let options = InitOptions::new(model_id).with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| {
            Error::Config(format!("failed to load embedding model {}: {}", model_name, e))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            dimension,
        })
    }

    /// Load on a blocking thread.
    pub async fn load_async(model_name: &str) -> Result<Self> {
        let name = model_name.to_string();
        tokio::task::spawn_blocking(move || Self::load(&name))
            .await
            .map_err(|e| Error::Internal(format!("embedding load task failed: {}", e)))?
    }
}

#[async_trait]
impl EmbeddingBackend for HuggingFaceEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        debug!(input_count = texts.len(), model = %self.model_name, "Embedding locally");

        let model = self.model.clone();
        let inputs = texts.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            model.embed(inputs, None)
        })
        .await
        .map_err(|e| Error::Internal(format!("embedding task failed: {}", e)))?
        .map_err(|e| Error::Internal(format!("local embedding failed: {}", e)))?;

        Ok(embeddings.into_iter().map(Vector::from).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_enum_maps_with_and_without_prefix() {
        assert!(model_enum("sentence-transformers/all-MiniLM-L6-v2").is_ok());
        assert!(model_enum("all-MiniLM-L6-v2").is_ok());
        assert!(model_enum("BAAI/bge-large-en-v1.5").is_ok());
    }

    #[test]
    fn model_enum_rejects_unknown() {
        assert!(model_enum("org/unknown-model").is_err());
    }
}
