//! Effective configuration resolution.
//!
//! Every workspace-scoped operation resolves an [`EffectiveConfig`]:
//! workspace overrides layered over the global settings row. Provider
//! requirement checks happen here so call sites get a uniform
//! `Error::Config` naming the missing field.

use crate::error::{Error, Result};
use crate::models::{AppSettings, Workspace};

/// The resolved configuration for one operation.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub llm_provider: String,
    pub llm_model: String,
    pub openai_api_key: Option<String>,
    pub ollama_base_url: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub enable_vision_processing: bool,
    pub vision_provider: String,
    pub ollama_vision_model: String,
}

impl EffectiveConfig {
    /// Resolve workspace overrides over global settings.
    pub fn resolve(workspace: &Workspace, settings: &AppSettings) -> Self {
        let llm_provider = workspace
            .llm_provider
            .clone()
            .unwrap_or_else(|| settings.llm_provider.clone());
        let llm_model = workspace.llm_model.clone().unwrap_or_else(|| {
            if llm_provider == "ollama" {
                settings.ollama_model.clone()
            } else {
                settings.openai_model.clone()
            }
        });
        Self {
            llm_provider,
            llm_model,
            openai_api_key: settings.openai_api_key.clone(),
            ollama_base_url: settings.ollama_base_url.clone(),
            embedding_provider: workspace
                .embedding_provider
                .clone()
                .unwrap_or_else(|| settings.embedding_provider.clone()),
            embedding_model: workspace
                .embedding_model
                .clone()
                .unwrap_or_else(|| settings.embedding_model.clone()),
            enable_vision_processing: settings.enable_vision_processing,
            vision_provider: settings.vision_provider.clone(),
            ollama_vision_model: settings.ollama_vision_model.clone(),
        }
    }

    /// Resolve from global settings alone (no workspace overrides).
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            llm_provider: settings.llm_provider.clone(),
            llm_model: if settings.llm_provider == "ollama" {
                settings.ollama_model.clone()
            } else {
                settings.openai_model.clone()
            },
            openai_api_key: settings.openai_api_key.clone(),
            ollama_base_url: settings.ollama_base_url.clone(),
            embedding_provider: settings.embedding_provider.clone(),
            embedding_model: settings.embedding_model.clone(),
            enable_vision_processing: settings.enable_vision_processing,
            vision_provider: settings.vision_provider.clone(),
            ollama_vision_model: settings.ollama_vision_model.clone(),
        }
    }

    /// Check that the configured LLM provider is usable.
    pub fn require_llm(&self) -> Result<()> {
        match self.llm_provider.as_str() {
            "openai" => {
                if self.openai_api_key.as_deref().unwrap_or("").is_empty() {
                    return Err(Error::Config(
                        "openai_api_key is required for the openai provider".into(),
                    ));
                }
            }
            "ollama" => {
                if self.ollama_base_url.is_empty() {
                    return Err(Error::Config(
                        "ollama_base_url is required for the ollama provider".into(),
                    ));
                }
            }
            other => {
                return Err(Error::Config(format!("unknown llm_provider: {}", other)));
            }
        }
        Ok(())
    }

    /// Check that the configured embedding provider is usable.
    pub fn require_embeddings(&self) -> Result<()> {
        match self.embedding_provider.as_str() {
            "openai" => {
                if self.openai_api_key.as_deref().unwrap_or("").is_empty() {
                    return Err(Error::Config(
                        "openai_api_key is required for openai embeddings".into(),
                    ));
                }
            }
            "huggingface" => {
                if self.embedding_model.is_empty() {
                    return Err(Error::Config(
                        "embedding_model is required for huggingface embeddings".into(),
                    ));
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown embedding_provider: {}",
                    other
                )));
            }
        }
        Ok(())
    }

    /// The embedding fingerprint `(provider, model)` this config produces.
    pub fn embedding_fingerprint(&self) -> (String, String) {
        (
            self.embedding_provider.clone(),
            self.embedding_model.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn workspace(overrides: bool) -> Workspace {
        Workspace {
            id: 1,
            name: "bio".to_string(),
            llm_provider: overrides.then(|| "ollama".to_string()),
            llm_model: overrides.then(|| "qwen2.5:7b".to_string()),
            embedding_provider: overrides.then(|| "huggingface".to_string()),
            embedding_model: overrides.then(|| "sentence-transformers/all-mpnet-base-v2".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_uses_global_when_no_overrides() {
        let settings = AppSettings {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let cfg = EffectiveConfig::resolve(&workspace(false), &settings);
        assert_eq!(cfg.llm_provider, "openai");
        assert_eq!(cfg.llm_model, settings.openai_model);
        assert_eq!(cfg.embedding_provider, "openai");
    }

    #[test]
    fn resolve_prefers_workspace_overrides() {
        let settings = AppSettings::default();
        let cfg = EffectiveConfig::resolve(&workspace(true), &settings);
        assert_eq!(cfg.llm_provider, "ollama");
        assert_eq!(cfg.llm_model, "qwen2.5:7b");
        assert_eq!(cfg.embedding_provider, "huggingface");
        assert_eq!(
            cfg.embedding_model,
            "sentence-transformers/all-mpnet-base-v2"
        );
    }

    #[test]
    fn resolve_picks_provider_default_model() {
        let settings = AppSettings {
            llm_provider: "ollama".to_string(),
            ..Default::default()
        };
        let cfg = EffectiveConfig::from_settings(&settings);
        assert_eq!(cfg.llm_model, settings.ollama_model);
    }

    #[test]
    fn require_llm_openai_needs_key() {
        let cfg = EffectiveConfig::from_settings(&AppSettings::default());
        assert!(cfg.require_llm().is_err());

        let cfg = EffectiveConfig::from_settings(&AppSettings {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        });
        assert!(cfg.require_llm().is_ok());
    }

    #[test]
    fn require_llm_rejects_unknown_provider() {
        let cfg = EffectiveConfig::from_settings(&AppSettings {
            llm_provider: "bedrock".to_string(),
            ..Default::default()
        });
        let err = cfg.require_llm().unwrap_err();
        assert!(err.to_string().contains("unknown llm_provider"));
    }

    #[test]
    fn require_embeddings_huggingface_needs_model() {
        let cfg = EffectiveConfig::from_settings(&AppSettings {
            embedding_provider: "huggingface".to_string(),
            embedding_model: String::new(),
            ..Default::default()
        });
        assert!(cfg.require_embeddings().is_err());
    }

    #[test]
    fn embedding_fingerprint_reflects_resolution() {
        let cfg = EffectiveConfig::resolve(&workspace(true), &AppSettings::default());
        assert_eq!(
            cfg.embedding_fingerprint(),
            (
                "huggingface".to_string(),
                "sentence-transformers/all-mpnet-base-v2".to_string()
            )
        );
    }
}
