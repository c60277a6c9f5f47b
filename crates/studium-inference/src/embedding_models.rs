//! Embedding model registry: (provider, model) → vector dimension.
//!
//! The dimension is fixed per fingerprint; the chunk store only has columns
//! for the dimensions listed in `defaults::SUPPORTED_DIMENSIONS`.

use studium_core::defaults::SUPPORTED_DIMENSIONS;
use studium_core::{Error, Result};

/// Known model dimensions per provider.
const KNOWN_MODELS: &[(&str, &str, usize)] = &[
    // OpenAI
    ("openai", "text-embedding-3-small", 1536),
    ("openai", "text-embedding-3-large", 1536),
    ("openai", "text-embedding-ada-002", 1536),
    // HuggingFace sentence-transformers
    ("huggingface", "sentence-transformers/all-MiniLM-L6-v2", 384),
    ("huggingface", "all-MiniLM-L6-v2", 384),
    ("huggingface", "sentence-transformers/all-MiniLM-L12-v2", 384),
    ("huggingface", "all-MiniLM-L12-v2", 384),
    ("huggingface", "sentence-transformers/all-mpnet-base-v2", 768),
    ("huggingface", "all-mpnet-base-v2", 768),
    ("huggingface", "BAAI/bge-small-en-v1.5", 384),
    ("huggingface", "BAAI/bge-base-en-v1.5", 768),
    ("huggingface", "BAAI/bge-large-en-v1.5", 1024),
    ("huggingface", "nomic-ai/nomic-embed-text-v1.5", 768),
    ("huggingface", "mixedbread-ai/mxbai-embed-large-v1", 1024),
];

/// Resolve the vector dimension for a (provider, model) fingerprint.
pub fn embedding_dimension(provider: &str, model: &str) -> Result<usize> {
    KNOWN_MODELS
        .iter()
        .find(|(p, m, _)| *p == provider && *m == model)
        .map(|(_, _, dim)| *dim)
        .ok_or_else(|| {
            Error::Config(format!(
                "unknown embedding model {} for provider {}",
                model, provider
            ))
        })
}

/// Whether the chunk store can hold vectors of this dimension.
pub fn is_supported_dimension(dim: usize) -> bool {
    SUPPORTED_DIMENSIONS.contains(&dim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_small_is_1536() {
        assert_eq!(
            embedding_dimension("openai", "text-embedding-3-small").unwrap(),
            1536
        );
    }

    #[test]
    fn minilm_is_384_with_or_without_org_prefix() {
        assert_eq!(
            embedding_dimension("huggingface", "sentence-transformers/all-MiniLM-L6-v2").unwrap(),
            384
        );
        assert_eq!(
            embedding_dimension("huggingface", "all-MiniLM-L6-v2").unwrap(),
            384
        );
    }

    #[test]
    fn mpnet_is_768() {
        assert_eq!(
            embedding_dimension("huggingface", "all-mpnet-base-v2").unwrap(),
            768
        );
    }

    #[test]
    fn unknown_model_errors() {
        let err = embedding_dimension("huggingface", "made-up-model").unwrap_err();
        assert!(err.to_string().contains("unknown embedding model"));
    }

    #[test]
    fn all_known_dimensions_are_supported() {
        for (_, _, dim) in KNOWN_MODELS {
            assert!(is_supported_dimension(*dim), "dimension {} unsupported", dim);
        }
        assert!(!is_supported_dimension(512));
    }
}
