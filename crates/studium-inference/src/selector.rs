//! Backend selection from effective configuration.
//!
//! Concrete adapters are constructed per call from the resolved config;
//! local HuggingFace models are cached after first load since
//! initialization pulls weights from disk (or the network).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use studium_core::defaults;
use studium_core::{
    EffectiveConfig, EmbeddingBackend, Error, GenerationBackend, Result, TtsBackend, VisionBackend,
};

use crate::embedding_models::embedding_dimension;
use crate::huggingface::HuggingFaceEmbeddingBackend;
use crate::ollama::OllamaBackend;
use crate::openai::{OpenAIBackend, OpenAIConfig};
use crate::tts::KokoroBackend;
use crate::vision::{OllamaVisionBackend, OpenAIVisionBackend};

/// Resolves effective configuration to concrete backends.
pub struct BackendSelector {
    hf_cache: Mutex<HashMap<String, Arc<HuggingFaceEmbeddingBackend>>>,
    tts: Arc<KokoroBackend>,
}

impl BackendSelector {
    pub fn new() -> Self {
        Self {
            hf_cache: Mutex::new(HashMap::new()),
            tts: Arc::new(KokoroBackend::from_env()),
        }
    }

    /// Generation backend for the configured LLM provider.
    pub fn generation(&self, cfg: &EffectiveConfig) -> Result<Box<dyn GenerationBackend>> {
        cfg.require_llm()?;
        match cfg.llm_provider.as_str() {
            "openai" => Ok(Box::new(OpenAIBackend::new(OpenAIConfig {
                api_key: cfg.openai_api_key.clone().unwrap_or_default(),
                gen_model: cfg.llm_model.clone(),
                ..Default::default()
            }))),
            "ollama" => Ok(Box::new(OllamaBackend::new_generation(
                cfg.ollama_base_url.clone(),
                cfg.llm_model.clone(),
            ))),
            other => Err(Error::Config(format!("unknown llm_provider: {}", other))),
        }
    }

    /// Embedding backend for the configured embedding provider.
    pub async fn embeddings(&self, cfg: &EffectiveConfig) -> Result<Arc<dyn EmbeddingBackend>> {
        cfg.require_embeddings()?;
        match cfg.embedding_provider.as_str() {
            "openai" => {
                let dimension = embedding_dimension("openai", &cfg.embedding_model)?;
                Ok(Arc::new(OpenAIBackend::new(OpenAIConfig {
                    api_key: cfg.openai_api_key.clone().unwrap_or_default(),
                    embed_model: cfg.embedding_model.clone(),
                    embed_dimension: dimension,
                    ..Default::default()
                })))
            }
            "huggingface" => {
                let mut cache = self.hf_cache.lock().await;
                if let Some(backend) = cache.get(&cfg.embedding_model) {
                    let shared: Arc<dyn EmbeddingBackend> = backend.clone();
                    return Ok(shared);
                }
                let backend =
                    Arc::new(HuggingFaceEmbeddingBackend::load_async(&cfg.embedding_model).await?);
                cache.insert(cfg.embedding_model.clone(), backend.clone());
                let shared: Arc<dyn EmbeddingBackend> = backend;
                Ok(shared)
            }
            other => Err(Error::Config(format!(
                "unknown embedding_provider: {}",
                other
            ))),
        }
    }

    /// Vision backend, if vision processing is enabled.
    pub fn vision(&self, cfg: &EffectiveConfig) -> Result<Box<dyn VisionBackend>> {
        if !cfg.enable_vision_processing {
            return Err(Error::Config("vision processing is disabled".into()));
        }
        match cfg.vision_provider.as_str() {
            "ollama" => Ok(Box::new(OllamaVisionBackend::new(
                cfg.ollama_base_url.clone(),
                cfg.ollama_vision_model.clone(),
            ))),
            _ => {
                let api_key = cfg.openai_api_key.clone().unwrap_or_default();
                if api_key.is_empty() {
                    return Err(Error::Config(
                        "openai_api_key is required for openai vision".into(),
                    ));
                }
                let model = if cfg.llm_provider == "openai" {
                    cfg.llm_model.clone()
                } else {
                    defaults::OPENAI_MODEL.to_string()
                };
                Ok(Box::new(OpenAIVisionBackend::new(
                    defaults::OPENAI_URL,
                    api_key,
                    model,
                )))
            }
        }
    }

    /// The shared TTS backend.
    pub fn tts(&self) -> Arc<dyn TtsBackend> {
        self.tts.clone()
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studium_core::AppSettings;

    fn cfg(settings: AppSettings) -> EffectiveConfig {
        EffectiveConfig::from_settings(&settings)
    }

    #[test]
    fn generation_requires_openai_key() {
        let selector = BackendSelector::new();
        let result = selector.generation(&cfg(AppSettings::default()));
        assert!(result.is_err());
    }

    #[test]
    fn generation_builds_ollama_without_key() {
        let selector = BackendSelector::new();
        let backend = selector
            .generation(&cfg(AppSettings {
                llm_provider: "ollama".to_string(),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(backend.model_name(), AppSettings::default().ollama_model);
    }

    #[tokio::test]
    async fn embeddings_rejects_unknown_openai_model() {
        let selector = BackendSelector::new();
        let result = selector
            .embeddings(&cfg(AppSettings {
                openai_api_key: Some("sk-test".to_string()),
                embedding_model: "text-embedding-imaginary".to_string(),
                ..Default::default()
            }))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn vision_disabled_is_config_error() {
        let selector = BackendSelector::new();
        let result = selector.vision(&cfg(AppSettings {
            enable_vision_processing: false,
            ..Default::default()
        }));
        assert!(result.is_err());
    }

    #[test]
    fn vision_ollama_needs_no_key() {
        let selector = BackendSelector::new();
        let backend = selector
            .vision(&cfg(AppSettings {
                vision_provider: "ollama".to_string(),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(backend.model_name(), "llava");
    }
}
