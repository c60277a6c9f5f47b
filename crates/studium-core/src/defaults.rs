//! Centralized default constants for the studium system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// CHUNKING
// =============================================================================

/// Maximum characters per chunk for text splitting.
pub const CHUNK_SIZE: usize = 1000;

/// Overlap characters between adjacent chunks for context preservation.
pub const CHUNK_OVERLAP: usize = 200;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Number of chunks retrieved for a chat turn.
pub const CHAT_TOP_K: i64 = 6;

/// Number of chunks retrieved for artifact generation.
pub const GENERATE_TOP_K: i64 = 12;

/// Number of prior chat turns included as conversational memory.
pub const CHAT_MEMORY_TURNS: i64 = 10;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Maximum inputs per embedding request.
pub const EMBED_BATCH_SIZE: usize = 64;

/// Embedding dimensions the chunk store has columns for.
pub const SUPPORTED_DIMENSIONS: [usize; 4] = [384, 768, 1024, 1536];

/// Default OpenAI embedding model.
pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";

/// Default HuggingFace embedding model.
pub const HF_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default OpenAI-compatible API base URL.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI chat model.
pub const OPENAI_MODEL: &str = "gpt-4o";

/// Default Ollama chat model.
pub const OLLAMA_MODEL: &str = "llama3.1";

/// Default Ollama vision model.
pub const OLLAMA_VISION_MODEL: &str = "llava";

/// Timeout for generation, vision, and TTS requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for health checks in seconds.
pub const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Base delay for provider retry backoff in milliseconds.
pub const RETRY_BASE_DELAY_MS: u64 = 100;

/// Multiplier applied to the retry delay after each attempt.
pub const RETRY_BACKOFF_FACTOR: f64 = 1.5;

/// Maximum attempts for retryable provider failures.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Attempts allowed for structured generation before giving up
/// (1 initial + 2 retries on schema-validation failure).
pub const STRUCTURED_GEN_ATTEMPTS: u32 = 3;

// =============================================================================
// TTS / PODCAST
// =============================================================================

/// Environment variable for the Kokoro-compatible TTS server URL.
pub const ENV_TTS_BASE_URL: &str = "STUDIUM_TTS_BASE_URL";

/// Default Kokoro-compatible TTS server URL.
pub const TTS_BASE_URL: &str = "http://localhost:8880";

/// Silence inserted between podcast turns, in milliseconds.
pub const PODCAST_TURN_GAP_MS: u32 = 500;

/// Maximum podcast versions retained per (workspace, topic, type).
pub const MAX_PODCAST_VERSIONS: i64 = 3;

// =============================================================================
// TASK PROCESSING
// =============================================================================

/// Worker poll interval when the queue is empty, in milliseconds.
pub const TASK_POLL_INTERVAL_MS: u64 = 500;

/// Per-task execution timeout in seconds (30 minutes; ingestion of large
/// documents against a local embedder is slow).
pub const TASK_TIMEOUT_SECS: u64 = 1800;

/// Per-command timeout for external extraction tools (seconds).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// SERVER / STORAGE
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Maximum upload size in bytes (50 MB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// Directory for uploaded documents, one subdirectory per workspace.
pub const UPLOAD_DIR: &str = "storage/uploads";

/// Directory for synthesized audio.
pub const AUDIO_DIR: &str = "storage/audio";

/// Environment variable pinning the embedding device ("cpu" or "cuda").
pub const ENV_DEVICE: &str = "STUDIUM_DEVICE";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_defaults_are_consistent() {
        const {
            assert!(CHUNK_OVERLAP < CHUNK_SIZE);
        }
    }

    #[test]
    fn retrieval_k_values() {
        const {
            assert!(CHAT_TOP_K < GENERATE_TOP_K);
        }
    }

    #[test]
    fn supported_dimensions_sorted() {
        let mut sorted = SUPPORTED_DIMENSIONS;
        sorted.sort();
        assert_eq!(sorted, SUPPORTED_DIMENSIONS);
    }

    #[test]
    fn structured_gen_allows_two_retries() {
        assert_eq!(STRUCTURED_GEN_ATTEMPTS, 3);
    }
}
