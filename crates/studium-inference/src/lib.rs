//! # studium-inference
//!
//! Provider adapters for studium: LLM generation, embeddings, vision
//! captioning, and speech synthesis.
//!
//! Each adapter family is a capability trait defined in `studium-core`;
//! concrete variants are selected per call from the effective configuration.
//! Transport failures are classified into `ProviderErrorKind` and retryable
//! kinds are retried with exponential backoff inside the adapter.

pub mod download;
pub mod embedding_models;
pub mod huggingface;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod selector;
pub mod tts;
pub mod vision;

pub use download::{DownloadEvent, Downloader};
pub use embedding_models::{embedding_dimension, is_supported_dimension};
pub use huggingface::HuggingFaceEmbeddingBackend;
pub use mock::{MockEmbeddingBackend, MockGenerationBackend, MockTtsBackend, MockVisionBackend};
pub use ollama::OllamaBackend;
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use retry::{classify_status, with_backoff};
pub use selector::BackendSelector;
pub use tts::KokoroBackend;
pub use vision::{OllamaVisionBackend, OpenAIVisionBackend};
