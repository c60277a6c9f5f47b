//! Core traits for studium abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// WORKSPACE REPOSITORY
// =============================================================================

/// Repository for workspace CRUD operations.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Create a workspace and return it.
    async fn create(&self, name: &str) -> Result<Workspace>;

    /// Fetch a workspace by id.
    async fn get(&self, id: i64) -> Result<Workspace>;

    /// List all workspaces, newest first.
    async fn list(&self) -> Result<Vec<Workspace>>;
}

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Request for creating a document record.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub workspace_id: i64,
    pub title: String,
    pub file_type: FileType,
    pub file_path: String,
}

/// Repository for document records.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a document in `pending` status.
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Document>;

    /// Fetch a document by id.
    async fn get(&self, id: i64) -> Result<Document>;

    /// List documents in a workspace, newest first.
    async fn list_for_workspace(&self, workspace_id: i64) -> Result<Vec<Document>>;

    /// Set the document status, clearing any previous error message.
    async fn set_status(&self, id: i64, status: DocumentStatus) -> Result<()>;

    /// Mark a document failed with a human-readable reason.
    async fn set_failed(&self, id: i64, error_message: &str) -> Result<()>;

    /// Delete a document; chunks cascade.
    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// CHUNK STORE
// =============================================================================

/// Transactional chunk store with workspace-scoped k-NN search.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Replace a document's chunks: delete then insert, atomically, and
    /// record the embedding fingerprint and `completed` status on the
    /// document row in the same transaction.
    async fn replace_for_document(
        &self,
        document_id: i64,
        workspace_id: i64,
        chunks: Vec<NewChunk>,
        dimension: usize,
        provider: &str,
        model: &str,
    ) -> Result<()>;

    /// Delete all chunks for a document.
    async fn delete_for_document(&self, document_id: i64) -> Result<()>;

    /// Count chunks for a document.
    async fn count_for_document(&self, document_id: i64) -> Result<i64>;

    /// Top-k chunks in the workspace whose embedding dimension equals
    /// `dimension`, ranked by cosine similarity descending, ties broken by
    /// `(document_id, ordinal)` ascending. Never returns chunks from other
    /// workspaces; dimension mismatch is a filter, not an error.
    async fn search(
        &self,
        workspace_id: i64,
        query: &Vector,
        dimension: usize,
        k: i64,
    ) -> Result<Vec<ChunkHit>>;

    /// Distinct embedding fingerprints across completed documents in the
    /// workspace.
    async fn document_fingerprints(&self, workspace_id: i64) -> Result<Vec<DocumentFingerprint>>;
}

// =============================================================================
// CHAT HISTORY
// =============================================================================

/// Append-only chat history, oldest-first retrieval order.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Append one message and return its id.
    async fn append(&self, workspace_id: i64, role: ChatRole, content: &str) -> Result<i64>;

    /// Full history for a workspace, oldest first.
    async fn history(&self, workspace_id: i64) -> Result<Vec<ChatMessage>>;

    /// The last `n` messages before (excluding) message `before_id`,
    /// returned oldest first. Used as the conversational memory window.
    async fn window_before(
        &self,
        workspace_id: i64,
        before_id: i64,
        n: i64,
    ) -> Result<Vec<ChatMessage>>;
}

// =============================================================================
// ARTIFACT STORE
// =============================================================================

/// Idempotent cache of generated artifacts.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Insert or replace the artifact for `(workspace, topic, kind)`.
    /// `podcast_script` always inserts a new row (versioned).
    async fn upsert(
        &self,
        workspace_id: i64,
        topic: &str,
        kind: ArtifactKind,
        payload: &JsonValue,
    ) -> Result<Artifact>;

    /// Fetch the cached artifact for a key, if any. For `podcast_script`
    /// this returns the most recent version.
    async fn get(
        &self,
        workspace_id: i64,
        topic: &str,
        kind: ArtifactKind,
    ) -> Result<Option<Artifact>>;

    /// All cached artifacts for `(workspace, topic)` in one call.
    async fn get_existing(&self, workspace_id: i64, topic: &str) -> Result<Vec<Artifact>>;

    /// Fetch an artifact by id.
    async fn get_by_id(&self, id: i64) -> Result<Artifact>;

    /// Replace the payload of an existing artifact row.
    async fn update_payload(&self, id: i64, payload: &JsonValue) -> Result<()>;
}

// =============================================================================
// PODCAST VERSIONS
// =============================================================================

/// Request for creating a podcast version row.
#[derive(Debug, Clone)]
pub struct CreatePodcastVersionRequest {
    pub workspace_id: i64,
    pub topic: String,
    pub podcast_type: PodcastType,
    pub voice_a: String,
    pub voice_b: Option<String>,
    pub voice_a_name: String,
    pub voice_b_name: Option<String>,
    pub script_artifact_id: i64,
}

/// Store for podcast versions with a bounded LRU per (workspace, topic, type).
#[async_trait]
pub trait PodcastRepository: Send + Sync {
    /// Create a version row with `audio_path = NULL`.
    async fn create(&self, req: CreatePodcastVersionRequest) -> Result<PodcastVersion>;

    /// Fetch a version by id.
    async fn get(&self, id: i64) -> Result<PodcastVersion>;

    /// Versions for a key, newest first.
    async fn list(
        &self,
        workspace_id: i64,
        topic: &str,
        podcast_type: PodcastType,
    ) -> Result<Vec<PodcastVersion>>;

    /// Delete rows beyond `max_versions` for the key (oldest first) and
    /// return the audio paths of the evicted rows so the caller can remove
    /// the files after the rows are gone.
    async fn evict_oldest(
        &self,
        workspace_id: i64,
        topic: &str,
        podcast_type: PodcastType,
        max_versions: i64,
    ) -> Result<Vec<String>>;

    /// Record the synthesized audio path on a version.
    async fn set_audio_path(&self, id: i64, audio_path: &str) -> Result<()>;

    /// Update the voice assignment on a version (used by re-synthesis).
    async fn update_voices(
        &self,
        id: i64,
        voice_a: &str,
        voice_b: Option<&str>,
        voice_a_name: &str,
        voice_b_name: Option<&str>,
    ) -> Result<()>;

    /// Delete one version, returning its audio path if set.
    async fn delete(&self, id: i64) -> Result<Option<String>>;

    /// All referenced audio paths (for the startup orphan sweep).
    async fn all_audio_paths(&self) -> Result<Vec<String>>;
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Persistence for the process-wide settings row.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the settings row, creating the default row if none exists.
    async fn get_or_create(&self) -> Result<AppSettings>;

    /// Apply a partial update and return the new settings.
    async fn update(&self, update: SettingsUpdate) -> Result<AppSettings>;
}

// =============================================================================
// TASK QUEUE
// =============================================================================

/// DB-backed FIFO task queue with per-entity deduplication and cooperative
/// cancellation.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Queue a task unless a pending/running task already exists for
    /// `(kind, entity_id)`; returns `None` in that case.
    async fn enqueue(
        &self,
        kind: TaskKind,
        entity_id: i64,
        payload: Option<JsonValue>,
    ) -> Result<Option<i64>>;

    /// Claim the next pending task (oldest first) for processing.
    async fn claim_next(&self, kinds: &[TaskKind]) -> Result<Option<Task>>;

    /// Persist the latest progress event for a task.
    async fn update_progress(&self, task_id: i64, percent: i32, message: Option<&str>)
        -> Result<()>;

    /// Mark a task completed.
    async fn complete(&self, task_id: i64) -> Result<()>;

    /// Mark a task failed.
    async fn fail(&self, task_id: i64, error: &str) -> Result<()>;

    /// Request cooperative cancellation of any pending/running task for
    /// `(kind, entity_id)`. Returns how many tasks were flagged.
    async fn request_cancel(&self, kind: TaskKind, entity_id: i64) -> Result<u64>;

    /// Whether cancellation has been requested for a task.
    async fn cancel_requested(&self, task_id: i64) -> Result<bool>;

    /// Fetch a task by id.
    async fn get(&self, task_id: i64) -> Result<Option<Task>>;
}

// =============================================================================
// INFERENCE BACKENDS
// =============================================================================

/// Backend for chat-completion text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Complete a conversation, returning the assistant text.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Complete a conversation in JSON mode, returning the raw assistant
    /// text (expected to parse as a single JSON value).
    async fn complete_json(&self, messages: &[Message]) -> Result<String>;

    /// The model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// The dimension of vectors this backend produces. Stable for a given
    /// (provider, model).
    fn dimension(&self) -> usize;

    /// The model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for describing images.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Produce a text caption for an image.
    async fn describe_image(&self, image_data: &[u8], mime_type: &str) -> Result<String>;

    /// The model name being used.
    fn model_name(&self) -> &str;
}

/// A voice offered by a TTS backend.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TtsVoice {
    pub id: String,
    pub name: String,
    pub gender: String,
}

/// Backend for speech synthesis.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize speech, returning WAV bytes.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;

    /// Voices this backend can speak with.
    fn voices(&self) -> Vec<TtsVoice>;

    /// The model name being used.
    fn model_name(&self) -> &str;
}
