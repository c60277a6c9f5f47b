//! Structured artifact generators.
//!
//! All generators share one template: retrieve context for the topic, call
//! the LLM with a per-kind output shape, validate, and cache the artifact
//! by `(workspace, topic, kind)`. Re-invocation with the same key returns
//! the cached artifact without another model call.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

use studium_core::defaults::GENERATE_TOP_K;
use studium_core::{
    Artifact, ArtifactKind, ArtifactRepository, EffectiveConfig, FlashcardSet, LessonPlan,
    Message, Mindmap, Quiz, Result, SettingsRepository, WorkspaceRepository,
};
use studium_db::Database;
use studium_inference::BackendSelector;

use crate::retriever::{context_block, Retriever};
use crate::structured::generate_structured;

/// The set of cached artifacts for a (workspace, topic), one per kind.
#[derive(Debug, Default, Serialize)]
pub struct ExistingArtifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcards: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindmap: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub podcast: Option<JsonValue>,
}

/// Artifact generator suite.
pub struct Generator {
    db: Database,
    selector: Arc<BackendSelector>,
    retriever: Arc<Retriever>,
}

impl Generator {
    pub fn new(db: Database, selector: Arc<BackendSelector>, retriever: Arc<Retriever>) -> Self {
        Self {
            db,
            selector,
            retriever,
        }
    }

    /// Shared generation template.
    async fn generate<T, F>(
        &self,
        workspace_id: i64,
        topic: &str,
        kind: ArtifactKind,
        system: &str,
        shape: &str,
        validate: F,
    ) -> Result<Artifact>
    where
        T: serde::de::DeserializeOwned + Serialize,
        F: Fn(&T) -> Result<()>,
    {
        if let Some(existing) = self.db.artifacts.get(workspace_id, topic, kind).await? {
            info!(workspace_id, topic, kind = kind.as_str(), "Returning cached artifact");
            return Ok(existing);
        }

        let hits = self
            .retriever
            .retrieve(workspace_id, topic, GENERATE_TOP_K)
            .await?;
        let context = context_block(&hits);

        let workspace = self.db.workspaces.get(workspace_id).await?;
        let settings = self.db.settings.get_or_create().await?;
        let cfg = EffectiveConfig::resolve(&workspace, &settings);
        let backend = self.selector.generation(&cfg)?;

        let messages = [
            Message::system(format!("{}\n\nRespond with a single JSON object shaped as:\n{}", system, shape)),
            Message::user(format!(
                "Context:\n{}\n\nTopic: {}\n\nGenerate the JSON now.",
                context, topic
            )),
        ];

        let payload: T = generate_structured(backend.as_ref(), &messages, validate).await?;
        let artifact = self
            .db
            .artifacts
            .upsert(workspace_id, topic, kind, &serde_json::to_value(&payload)?)
            .await?;

        info!(workspace_id, topic, kind = kind.as_str(), artifact_id = artifact.id, "Artifact generated");
        Ok(artifact)
    }

    /// Generate (or return the cached) lesson plan.
    #[instrument(skip(self), fields(subsystem = "engine", component = "generator"))]
    pub async fn lesson(&self, workspace_id: i64, topic: &str) -> Result<Artifact> {
        self.generate::<LessonPlan, _>(
            workspace_id,
            topic,
            ArtifactKind::Lesson,
            "You are an expert educational content creator. Create a comprehensive lesson \
             plan based strictly on the provided context.",
            r#"{"topic": string, "sections": [{"title": string, "content": string, "key_points": [string]}]}"#,
            |plan| plan.validate(),
        )
        .await
    }

    /// Generate (or return the cached) flashcard set.
    #[instrument(skip(self), fields(subsystem = "engine", component = "generator"))]
    pub async fn flashcards(&self, workspace_id: i64, topic: &str) -> Result<Artifact> {
        self.generate::<FlashcardSet, _>(
            workspace_id,
            topic,
            ArtifactKind::Flashcards,
            "Create a set of 10-20 flashcards (front/back) based on the context to help a \
             student learn the key concepts.",
            r#"{"topic": string, "cards": [{"front": string, "back": string}]}"#,
            |set| set.validate(),
        )
        .await
    }

    /// Generate (or return the cached) quiz.
    #[instrument(skip(self), fields(subsystem = "engine", component = "generator"))]
    pub async fn quiz(&self, workspace_id: i64, topic: &str) -> Result<Artifact> {
        self.generate::<Quiz, _>(
            workspace_id,
            topic,
            ArtifactKind::Quiz,
            "Create a multiple-choice quiz based on the context. Every question must have \
             exactly 4 options, a correct_answer_index between 0 and 3, and an explanation.",
            r#"{"title": string, "questions": [{"question": string, "options": [string, string, string, string], "correct_answer_index": 0-3, "explanation": string}]}"#,
            |quiz| quiz.validate(),
        )
        .await
    }

    /// Generate (or return the cached) concept map.
    #[instrument(skip(self), fields(subsystem = "engine", component = "generator"))]
    pub async fn mindmap(&self, workspace_id: i64, topic: &str) -> Result<Artifact> {
        self.generate::<Mindmap, _>(
            workspace_id,
            topic,
            ArtifactKind::Mindmap,
            "Create a concept map of the topic from the context. Node ids must be unique; \
             every edge's source and target must reference existing node ids; the graph \
             must be acyclic. Use type \"input\" for the root concept, \"output\" for \
             leaf details, and \"default\" otherwise.",
            r#"{"nodes": [{"id": string, "label": string, "type": "input"|"default"|"output"}], "edges": [{"source": string, "target": string, "label": string|null}]}"#,
            |map| map.validate(),
        )
        .await
    }

    /// All cached artifacts for a (workspace, topic) in one call.
    pub async fn get_existing(&self, workspace_id: i64, topic: &str) -> Result<ExistingArtifacts> {
        let artifacts = self.db.artifacts.get_existing(workspace_id, topic).await?;
        let mut existing = ExistingArtifacts::default();
        for artifact in artifacts {
            match artifact.kind {
                ArtifactKind::Lesson => existing.lesson = Some(artifact.payload),
                ArtifactKind::Flashcards => existing.flashcards = Some(artifact.payload),
                ArtifactKind::Quiz => existing.quiz = Some(artifact.payload),
                ArtifactKind::Mindmap => existing.mindmap = Some(artifact.payload),
                ArtifactKind::PodcastScript => existing.podcast = Some(artifact.payload),
            }
        }
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_artifacts_serializes_sparsely() {
        let existing = ExistingArtifacts {
            quiz: Some(serde_json::json!({"title": "t", "questions": []})),
            ..Default::default()
        };
        let json = serde_json::to_value(&existing).unwrap();
        assert!(json.get("quiz").is_some());
        assert!(json.get("lesson").is_none());
        assert!(json.get("podcast").is_none());
    }
}
