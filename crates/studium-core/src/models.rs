//! Data model types for studium entities and generated artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

// Re-export the pgvector type used for embeddings throughout.
pub use pgvector::Vector;

// =============================================================================
// ENUMS
// =============================================================================

/// Supported document file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Pptx,
    Image,
}

impl FileType {
    /// Detect the file type from a filename extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "pptx" | "ppt" => Some(Self::Pptx),
            "jpg" | "jpeg" | "png" | "webp" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Image => "image",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// Chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        if s == "assistant" {
            Self::Assistant
        } else {
            Self::User
        }
    }
}

/// Kinds of generated study artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Lesson,
    Flashcards,
    Quiz,
    Mindmap,
    PodcastScript,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Flashcards => "flashcards",
            Self::Quiz => "quiz",
            Self::Mindmap => "mindmap",
            Self::PodcastScript => "podcast_script",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "lesson" => Some(Self::Lesson),
            "flashcards" => Some(Self::Flashcards),
            "quiz" => Some(Self::Quiz),
            "mindmap" => Some(Self::Mindmap),
            "podcast_script" => Some(Self::PodcastScript),
            _ => None,
        }
    }
}

/// Single-narrator or two-speaker podcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodcastType {
    Single,
    Duo,
}

impl PodcastType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Duo => "duo",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "duo" => Some(Self::Duo),
            _ => None,
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A workspace: the unit of retrieval isolation. Optional provider fields
/// shadow the global settings row for operations scoped to this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An uploaded document and its ingestion state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub workspace_id: i64,
    pub title: String,
    pub file_type: FileType,
    pub file_path: String,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    /// Set when ingestion writes the first chunk; the authoritative
    /// fingerprint for compatibility checks.
    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A chunk ready for insertion into the store.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub ordinal: i32,
    pub content: String,
    pub metadata: JsonValue,
    pub embedding: Vector,
}

/// A chunk returned by semantic search.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkHit {
    pub chunk_id: i64,
    pub document_id: i64,
    pub workspace_id: i64,
    pub ordinal: i32,
    pub content: String,
    pub metadata: JsonValue,
    /// Cosine similarity in [-1, 1], higher is closer.
    pub score: f32,
}

/// The (provider, model) pair a completed document was embedded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFingerprint {
    pub document_id: i64,
    pub title: String,
    pub provider: String,
    pub model: String,
}

/// One turn of chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub workspace_id: i64,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A cached generation result keyed by (workspace, topic, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub workspace_id: i64,
    pub topic: String,
    pub kind: ArtifactKind,
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// A podcast instance: script reference, voice assignment, and (once
/// synthesized) the audio file. At most `MAX_PODCAST_VERSIONS` are kept per
/// (workspace, topic, type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastVersion {
    pub id: i64,
    pub workspace_id: i64,
    pub topic: String,
    pub podcast_type: PodcastType,
    pub voice_a: String,
    pub voice_b: Option<String>,
    pub voice_a_name: String,
    pub voice_b_name: Option<String>,
    pub script_artifact_id: i64,
    pub audio_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Process-wide settings row. Read-mostly; updated through
/// `SettingsRepository::update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub llm_provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub enable_vision_processing: bool,
    pub vision_provider: String,
    pub ollama_vision_model: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            llm_provider: "openai".to_string(),
            openai_api_key: None,
            openai_model: crate::defaults::OPENAI_MODEL.to_string(),
            ollama_base_url: crate::defaults::OLLAMA_URL.to_string(),
            ollama_model: crate::defaults::OLLAMA_MODEL.to_string(),
            embedding_provider: "openai".to_string(),
            embedding_model: crate::defaults::OPENAI_EMBED_MODEL.to_string(),
            enable_vision_processing: true,
            vision_provider: "openai".to_string(),
            ollama_vision_model: crate::defaults::OLLAMA_VISION_MODEL.to_string(),
        }
    }
}

/// Partial settings update; `None` fields are left unchanged. The API key
/// uses a nested Option so callers can clear it explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub llm_provider: Option<String>,
    #[serde(default, with = "double_option")]
    pub openai_api_key: Option<Option<String>>,
    pub openai_model: Option<String>,
    pub ollama_base_url: Option<String>,
    pub ollama_model: Option<String>,
    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
    pub enable_vision_processing: Option<bool>,
    pub vision_provider: Option<String>,
    pub ollama_vision_model: Option<String>,
}

/// Serde helper distinguishing "absent" from "present but null".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(de).map(Some)
    }
}

// =============================================================================
// TASK QUEUE
// =============================================================================

/// Kinds of background tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Ingest,
    Synthesize,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Synthesize => "synthesize",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s {
            "ingest" => Some(Self::Ingest),
            "synthesize" => Some(Self::Synthesize),
            _ => None,
        }
    }
}

/// Lifecycle status of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// A queued background task. `entity_id` is a document id for `Ingest`
/// tasks and a podcast version id for `Synthesize` tasks.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: i64,
    pub kind: TaskKind,
    pub entity_id: i64,
    pub status: TaskStatus,
    pub payload: Option<JsonValue>,
    pub error_message: Option<String>,
    pub progress_percent: i32,
    pub progress_message: Option<String>,
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// GENERATION PAYLOADS
// =============================================================================

/// One section of a lesson plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSection {
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
}

/// A structured lesson plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlan {
    pub topic: String,
    pub sections: Vec<LessonSection>,
}

impl LessonPlan {
    pub fn validate(&self) -> Result<()> {
        if self.sections.is_empty() {
            return Err(Error::Validation("lesson plan has no sections".into()));
        }
        Ok(())
    }
}

/// A front/back flashcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// A set of flashcards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub topic: String,
    pub cards: Vec<Flashcard>,
}

impl FlashcardSet {
    pub fn validate(&self) -> Result<()> {
        if self.cards.is_empty() {
            return Err(Error::Validation("flashcard set has no cards".into()));
        }
        Ok(())
    }
}

/// A multiple-choice quiz question. Exactly 4 options; the answer index
/// addresses one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: u32,
    pub explanation: String,
}

/// A multiple-choice quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn validate(&self) -> Result<()> {
        if self.questions.is_empty() {
            return Err(Error::Validation("quiz has no questions".into()));
        }
        for (i, q) in self.questions.iter().enumerate() {
            if q.options.len() != 4 {
                return Err(Error::Validation(format!(
                    "question {} has {} options, expected 4",
                    i + 1,
                    q.options.len()
                )));
            }
            if q.correct_answer_index > 3 {
                return Err(Error::Validation(format!(
                    "question {} answer index {} out of range",
                    i + 1,
                    q.correct_answer_index
                )));
            }
        }
        Ok(())
    }
}

/// Mindmap node role, matching the renderer's node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MindmapNodeType {
    Input,
    Default,
    Output,
}

/// A mindmap node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindmapNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: MindmapNodeType,
}

/// A directed mindmap edge between two node ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindmapEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// A concept map: nodes plus directed acyclic edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mindmap {
    pub nodes: Vec<MindmapNode>,
    pub edges: Vec<MindmapEdge>,
}

impl Mindmap {
    /// Validate referential integrity and acyclicity.
    pub fn validate(&self) -> Result<()> {
        use std::collections::{HashMap, HashSet};

        if self.nodes.is_empty() {
            return Err(Error::Validation("mindmap has no nodes".into()));
        }

        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        if ids.len() != self.nodes.len() {
            return Err(Error::Validation("mindmap has duplicate node ids".into()));
        }
        for e in &self.edges {
            if !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()) {
                return Err(Error::Validation(format!(
                    "edge {} -> {} references a missing node",
                    e.source, e.target
                )));
            }
        }

        // Cycle detection: iterative DFS with a three-color marking.
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for e in &self.edges {
            adjacency
                .entry(e.source.as_str())
                .or_default()
                .push(e.target.as_str());
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }
        let mut marks: HashMap<&str, Mark> =
            ids.iter().map(|&id| (id, Mark::White)).collect();

        for &start in &ids {
            if marks[start] != Mark::White {
                continue;
            }
            // (node, child cursor) stack
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            marks.insert(start, Mark::Grey);
            while let Some((node, cursor)) = stack.pop() {
                let children = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
                if cursor < children.len() {
                    stack.push((node, cursor + 1));
                    let child = children[cursor];
                    match marks[child] {
                        Mark::Grey => {
                            return Err(Error::Validation(format!(
                                "mindmap contains a cycle through {}",
                                child
                            )));
                        }
                        Mark::White => {
                            marks.insert(child, Mark::Grey);
                            stack.push((child, 0));
                        }
                        Mark::Black => {}
                    }
                } else {
                    marks.insert(node, Mark::Black);
                }
            }
        }

        Ok(())
    }
}

/// One spoken turn of a podcast script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastTurn {
    pub speaker: String,
    pub voice: String,
    pub text: String,
}

/// A generated podcast script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastScript {
    pub topic: String,
    pub script: Vec<PodcastTurn>,
}

impl PodcastScript {
    /// Validate the script for the given podcast type. Duo scripts need at
    /// least two distinct speakers.
    pub fn validate(&self, podcast_type: PodcastType) -> Result<()> {
        if self.script.is_empty() {
            return Err(Error::Validation("podcast script has no turns".into()));
        }
        if podcast_type == PodcastType::Duo {
            let speakers: std::collections::HashSet<&str> =
                self.script.iter().map(|t| t.speaker.as_str()).collect();
            if speakers.len() < 2 {
                return Err(Error::Validation(
                    "duo podcast script needs at least two distinct speakers".into(),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// PROMPT MESSAGES
// =============================================================================

/// A chat-completion message sent to a generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_filename() {
        assert_eq!(FileType::from_filename("notes.pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_filename("essay.DOCX"), Some(FileType::Docx));
        assert_eq!(FileType::from_filename("deck.pptx"), Some(FileType::Pptx));
        assert_eq!(FileType::from_filename("fig.PNG"), Some(FileType::Image));
        assert_eq!(FileType::from_filename("data.csv"), None);
        assert_eq!(FileType::from_filename("noext"), None);
    }

    #[test]
    fn status_round_trips() {
        for s in [
            DocumentStatus::Pending,
            DocumentStatus::Processing,
            DocumentStatus::Completed,
            DocumentStatus::Failed,
        ] {
            assert_eq!(DocumentStatus::from_str_loose(s.as_str()), s);
        }
        for s in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from_str_loose(s.as_str()), s);
        }
    }

    #[test]
    fn artifact_kind_round_trips() {
        for k in [
            ArtifactKind::Lesson,
            ArtifactKind::Flashcards,
            ArtifactKind::Quiz,
            ArtifactKind::Mindmap,
            ArtifactKind::PodcastScript,
        ] {
            assert_eq!(ArtifactKind::from_str_loose(k.as_str()), Some(k));
        }
        assert_eq!(ArtifactKind::from_str_loose("podcast"), None);
    }

    #[test]
    fn quiz_validation_accepts_well_formed() {
        let quiz = Quiz {
            title: "Cell Biology".to_string(),
            questions: vec![QuizQuestion {
                question: "What is the powerhouse of the cell?".to_string(),
                options: vec![
                    "Nucleus".into(),
                    "Mitochondrion".into(),
                    "Ribosome".into(),
                    "Golgi apparatus".into(),
                ],
                correct_answer_index: 1,
                explanation: "Mitochondria produce ATP.".to_string(),
            }],
        };
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn quiz_validation_rejects_wrong_option_count() {
        let quiz = Quiz {
            title: "t".to_string(),
            questions: vec![QuizQuestion {
                question: "q".to_string(),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_answer_index: 0,
                explanation: "e".to_string(),
            }],
        };
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn quiz_validation_rejects_out_of_range_answer() {
        let quiz = Quiz {
            title: "t".to_string(),
            questions: vec![QuizQuestion {
                question: "q".to_string(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer_index: 4,
                explanation: "e".to_string(),
            }],
        };
        assert!(quiz.validate().is_err());
    }

    fn node(id: &str) -> MindmapNode {
        MindmapNode {
            id: id.to_string(),
            label: id.to_uppercase(),
            node_type: MindmapNodeType::Default,
        }
    }

    fn edge(source: &str, target: &str) -> MindmapEdge {
        MindmapEdge {
            source: source.to_string(),
            target: target.to_string(),
            label: None,
        }
    }

    #[test]
    fn mindmap_validation_accepts_dag() {
        let map = Mindmap {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![edge("a", "b"), edge("a", "c"), edge("b", "c")],
        };
        assert!(map.validate().is_ok());
    }

    #[test]
    fn mindmap_validation_rejects_cycle() {
        let map = Mindmap {
            nodes: vec![node("a"), node("b"), node("c")],
            edges: vec![edge("a", "b"), edge("b", "c"), edge("c", "a")],
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn mindmap_validation_rejects_self_loop() {
        let map = Mindmap {
            nodes: vec![node("a")],
            edges: vec![edge("a", "a")],
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn mindmap_validation_rejects_dangling_edge() {
        let map = Mindmap {
            nodes: vec![node("a")],
            edges: vec![edge("a", "ghost")],
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn mindmap_validation_rejects_duplicate_ids() {
        let map = Mindmap {
            nodes: vec![node("a"), node("a")],
            edges: vec![],
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn podcast_script_duo_needs_two_speakers() {
        let turn = |speaker: &str| PodcastTurn {
            speaker: speaker.to_string(),
            voice: "af_bella".to_string(),
            text: "Hello".to_string(),
        };
        let script = PodcastScript {
            topic: "Photosynthesis".to_string(),
            script: vec![turn("Alex"), turn("Alex")],
        };
        assert!(script.validate(PodcastType::Duo).is_err());
        assert!(script.validate(PodcastType::Single).is_ok());

        let script = PodcastScript {
            topic: "Photosynthesis".to_string(),
            script: vec![turn("Alex"), turn("Jamie")],
        };
        assert!(script.validate(PodcastType::Duo).is_ok());
    }

    #[test]
    fn settings_update_distinguishes_absent_from_null() {
        let update: SettingsUpdate = serde_json::from_str(r#"{"openai_model":"gpt-4o"}"#).unwrap();
        assert!(update.openai_api_key.is_none());

        let update: SettingsUpdate =
            serde_json::from_str(r#"{"openai_api_key":null}"#).unwrap();
        assert_eq!(update.openai_api_key, Some(None));

        let update: SettingsUpdate =
            serde_json::from_str(r#"{"openai_api_key":"sk-test"}"#).unwrap();
        assert_eq!(update.openai_api_key, Some(Some("sk-test".to_string())));
    }

    #[test]
    fn message_constructors() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");
    }

    #[test]
    fn quiz_payload_round_trip() {
        let quiz = Quiz {
            title: "Quiz".to_string(),
            questions: vec![],
        };
        let json = serde_json::to_value(&quiz).unwrap();
        let back: Quiz = serde_json::from_value(json).unwrap();
        assert_eq!(back.title, "Quiz");
    }
}
