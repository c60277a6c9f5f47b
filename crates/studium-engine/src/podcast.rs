//! Podcast orchestration: script generation, version bookkeeping with LRU
//! eviction, synthesis task dispatch, and the startup audio sweep.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use studium_core::defaults::{GENERATE_TOP_K, MAX_PODCAST_VERSIONS};
use studium_core::voices::voice_info;
use studium_core::{
    ArtifactKind, ArtifactRepository, CreatePodcastVersionRequest, EffectiveConfig, Error,
    Message, PodcastRepository, PodcastScript, PodcastType, PodcastVersion, Result,
    SettingsRepository, TaskKind, TaskRepository, WorkspaceRepository,
};
use studium_db::Database;
use studium_inference::BackendSelector;

use crate::retriever::{context_block, Retriever};
use crate::structured::generate_structured;

const DUO_PROMPT: &str = "You are a world-class podcast scriptwriter. Create a conversational \
     script for a podcast called \"Deep Dive\" based on the provided context. The podcast \
     features two speakers: Alex, the curious host who asks insightful questions and keeps \
     the energy high, and Jamie, the expert who explains complex concepts in simple terms. \
     The conversation should be engaging, natural, and educational; use informal language \
     and emotional reactions.";

const SINGLE_PROMPT: &str = "You are a world-class audiobook narrator. Create a clear, \
     engaging summary script based on the provided context, narrated by a single speaker \
     named Bella.";

const SCRIPT_SHAPE: &str =
    r#"{"topic": string, "script": [{"speaker": string, "voice": string, "text": string}]}"#;

/// Podcast service: script + version lifecycle.
pub struct PodcastService {
    db: Database,
    selector: Arc<BackendSelector>,
    retriever: Arc<Retriever>,
    audio_dir: PathBuf,
}

impl PodcastService {
    pub fn new(
        db: Database,
        selector: Arc<BackendSelector>,
        retriever: Arc<Retriever>,
        audio_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            selector,
            retriever,
            audio_dir: audio_dir.into(),
        }
    }

    /// Generate a fresh script, create a version row, enforce the LRU cap,
    /// and queue synthesis. Returns the version stub (`audio_path` null).
    #[instrument(skip(self), fields(subsystem = "engine", component = "podcast", workspace_id, topic))]
    pub async fn generate(
        &self,
        workspace_id: i64,
        topic: &str,
        podcast_type: PodcastType,
        voice_a: &str,
        voice_b: Option<&str>,
    ) -> Result<PodcastVersion> {
        if podcast_type == PodcastType::Duo && voice_b.is_none() {
            return Err(Error::Validation("duo podcasts require voice_b".into()));
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

        let system = match podcast_type {
            PodcastType::Duo => DUO_PROMPT,
            PodcastType::Single => SINGLE_PROMPT,
        };
        let messages = [
            Message::system(format!(
                "{}\n\nRespond with a single JSON object shaped as:\n{}",
                system, SCRIPT_SHAPE
            )),
            Message::user(format!(
                "Context:\n{}\n\nTopic: {}\n\nGenerate the script now.",
                context, topic
            )),
        ];

        let mut script: PodcastScript =
            generate_structured(backend.as_ref(), &messages, |s: &PodcastScript| {
                s.validate(podcast_type)
            })
            .await?;
        assign_voices(&mut script, podcast_type, voice_a, voice_b);

        let artifact = self
            .db
            .artifacts
            .upsert(
                workspace_id,
                topic,
                ArtifactKind::PodcastScript,
                &serde_json::to_value(&script)?,
            )
            .await?;

        let (voice_a_name, _) = voice_info(voice_a);
        let voice_b_name = voice_b.map(|v| voice_info(v).0);
        let version = self
            .db
            .podcasts
            .create(CreatePodcastVersionRequest {
                workspace_id,
                topic: topic.to_string(),
                podcast_type,
                voice_a: voice_a.to_string(),
                voice_b: voice_b.map(String::from),
                voice_a_name,
                voice_b_name,
                script_artifact_id: artifact.id,
            })
            .await?;

        // Enforce the cap before synthesis; rows go first, files after.
        let evicted = self
            .db
            .podcasts
            .evict_oldest(workspace_id, topic, podcast_type, MAX_PODCAST_VERSIONS)
            .await?;
        for filename in evicted {
            remove_audio_file(&self.audio_dir, &filename);
        }

        self.db
            .tasks
            .enqueue(TaskKind::Synthesize, version.id, None)
            .await?;

        info!(version_id = version.id, topic, "Podcast version created, synthesis queued");
        Ok(version)
    }

    /// Re-synthesize the most recent version for a key with a new voice
    /// assignment. Audio is replaced in place; no new version is created
    /// and the LRU is unaffected.
    pub async fn resynthesize(
        &self,
        workspace_id: i64,
        topic: &str,
        podcast_type: PodcastType,
        voice_a: &str,
        voice_b: Option<&str>,
    ) -> Result<PodcastVersion> {
        if podcast_type == PodcastType::Duo && voice_b.is_none() {
            return Err(Error::Validation("duo podcasts require voice_b".into()));
        }

        let versions = self.db.podcasts.list(workspace_id, topic, podcast_type).await?;
        let version = versions.into_iter().next().ok_or_else(|| {
            Error::NotFound(format!("no podcast versions for topic \"{}\"", topic))
        })?;

        // Re-voice the stored script and update the version's assignment.
        let artifact = self.db.artifacts.get_by_id(version.script_artifact_id).await?;
        let mut script: PodcastScript = serde_json::from_value(artifact.payload)?;
        assign_voices(&mut script, podcast_type, voice_a, voice_b);
        self.db
            .artifacts
            .update_payload(artifact.id, &serde_json::to_value(&script)?)
            .await?;

        let (voice_a_name, _) = voice_info(voice_a);
        let voice_b_name = voice_b.map(|v| voice_info(v).0);
        self.db
            .podcasts
            .update_voices(
                version.id,
                voice_a,
                voice_b,
                &voice_a_name,
                voice_b_name.as_deref(),
            )
            .await?;

        self.db
            .tasks
            .enqueue(TaskKind::Synthesize, version.id, None)
            .await?;

        info!(version_id = version.id, topic, "Re-synthesis queued");
        self.db.podcasts.get(version.id).await
    }

    /// Delete a version and its audio file.
    pub async fn delete_version(&self, version_id: i64) -> Result<()> {
        let audio = self.db.podcasts.delete(version_id).await?;
        if let Some(filename) = audio {
            remove_audio_file(&self.audio_dir, &filename);
        }
        Ok(())
    }

    /// Remove audio files no version row references. Run at startup: LRU
    /// eviction deletes files only after rows, so a crash between the two
    /// can leak files but never dangle rows.
    pub async fn sweep_orphaned_audio(&self) -> Result<usize> {
        let referenced: std::collections::HashSet<String> =
            self.db.podcasts.all_audio_paths().await?.into_iter().collect();

        let mut removed = 0;
        let entries = match std::fs::read_dir(&self.audio_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::Io(e)),
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !referenced.contains(&name) {
                remove_audio_file(&self.audio_dir, &name);
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Swept orphaned audio files");
        }
        Ok(removed)
    }
}

/// Map script speakers onto the requested voices. The first distinct
/// speaker gets `voice_a`; in duo mode the second gets `voice_b`.
fn assign_voices(
    script: &mut PodcastScript,
    podcast_type: PodcastType,
    voice_a: &str,
    voice_b: Option<&str>,
) {
    let mut speakers: Vec<String> = Vec::new();
    for turn in &script.script {
        if !speakers.contains(&turn.speaker) {
            speakers.push(turn.speaker.clone());
        }
    }

    for turn in script.script.iter_mut() {
        let position = speakers.iter().position(|s| s == &turn.speaker).unwrap_or(0);
        turn.voice = match (podcast_type, position) {
            (PodcastType::Single, _) | (PodcastType::Duo, 0) => voice_a.to_string(),
            (PodcastType::Duo, _) => voice_b.unwrap_or(voice_a).to_string(),
        };
    }
}

/// Delete an audio file by stored filename, tolerating absence.
fn remove_audio_file(audio_dir: &Path, filename: &str) {
    let path = audio_dir.join(filename);
    if let Err(e) = std::fs::remove_file(&path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to delete audio file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studium_core::PodcastTurn;

    fn script(speakers: &[&str]) -> PodcastScript {
        PodcastScript {
            topic: "Cells".to_string(),
            script: speakers
                .iter()
                .map(|s| PodcastTurn {
                    speaker: s.to_string(),
                    voice: "model-chosen".to_string(),
                    text: format!("{} says something", s),
                })
                .collect(),
        }
    }

    #[test]
    fn duo_voices_assigned_by_speaker_order() {
        let mut s = script(&["Alex", "Jamie", "Alex", "Jamie"]);
        assign_voices(&mut s, PodcastType::Duo, "af_bella", Some("bm_lewis"));
        assert_eq!(s.script[0].voice, "af_bella");
        assert_eq!(s.script[1].voice, "bm_lewis");
        assert_eq!(s.script[2].voice, "af_bella");
        assert_eq!(s.script[3].voice, "bm_lewis");
    }

    #[test]
    fn single_voice_overrides_all_turns() {
        let mut s = script(&["Bella", "Bella"]);
        assign_voices(&mut s, PodcastType::Single, "af_sky", None);
        assert!(s.script.iter().all(|t| t.voice == "af_sky"));
    }

    #[test]
    fn duo_missing_voice_b_falls_back_to_voice_a() {
        let mut s = script(&["Alex", "Jamie"]);
        assign_voices(&mut s, PodcastType::Duo, "af_bella", None);
        assert_eq!(s.script[1].voice, "af_bella");
    }
}
