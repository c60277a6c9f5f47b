//! Podcast synthesis task: script turns → voiced audio → one WAV file.
//!
//! Each turn is synthesized by the TTS backend and appended to an
//! in-memory assembler with a half-second gap between turns. Progress is
//! streamed per turn; the file is written once at the end and the version
//! row updated. Re-synthesis replaces the audio on the same version.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use studium_core::defaults::PODCAST_TURN_GAP_MS;
use studium_core::wav::WavAssembler;
use studium_core::{
    ArtifactRepository, Error, PodcastRepository, PodcastScript, ProgressEvent, ProgressHub,
    ProgressKey, ProgressStage, Result, TaskKind, TtsBackend,
};
use studium_db::Database;
use studium_inference::BackendSelector;
use uuid::Uuid;

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Handler for `synthesize` tasks. `entity_id` is the podcast version id.
pub struct SynthesizeHandler {
    db: Database,
    selector: Arc<BackendSelector>,
    hub: Arc<ProgressHub>,
    audio_dir: PathBuf,
}

impl SynthesizeHandler {
    pub fn new(
        db: Database,
        selector: Arc<BackendSelector>,
        hub: Arc<ProgressHub>,
        audio_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            selector,
            hub,
            audio_dir: audio_dir.into(),
        }
    }

    fn publish(&self, version_id: i64, stage: ProgressStage, percent: u8, message: &str) {
        self.hub.publish(
            ProgressKey::PodcastVersion(version_id),
            ProgressEvent::new(stage, percent, message),
        );
    }

    #[instrument(skip(self, ctx), fields(subsystem = "jobs", component = "synthesize", version_id = ctx.entity_id()))]
    async fn run(&self, ctx: &TaskContext) -> Result<()> {
        let version_id = ctx.entity_id();
        let version = self.db.podcasts.get(version_id).await?;
        let script_artifact = self.db.artifacts.get_by_id(version.script_artifact_id).await?;
        let script: PodcastScript = serde_json::from_value(script_artifact.payload)?;

        let tts = self.selector.tts();
        let total = script.script.len();
        if total == 0 {
            return Err(Error::Validation("podcast script has no turns".into()));
        }

        let mut assembler = WavAssembler::new();
        for (i, turn) in script.script.iter().enumerate() {
            let audio = tts.synthesize(&turn.text, &turn.voice).await?;
            assembler.push(&audio)?;
            assembler.push_silence(PODCAST_TURN_GAP_MS);

            let done = i + 1;
            let percent = (done * 100 / total) as u8;
            let message = format!("Turn {}/{}", done, total);
            ctx.report_progress(percent as i32, Some(&message));
            self.publish(version_id, ProgressStage::Synthesizing, percent, &message);

            if self.db.tasks.cancel_requested(ctx.task.id).await.unwrap_or(false) {
                return Err(Error::Task("cancelled".into()));
            }
        }

        let combined = assembler.finish()?;

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(Error::Io)?;
        let filename = format!("podcast_{}.wav", Uuid::new_v4().simple());
        let path = self.audio_dir.join(&filename);
        tokio::fs::write(&path, &combined).await.map_err(Error::Io)?;

        // Replace-in-place semantics: drop the previous audio file after
        // the row points at the new one.
        let previous = version.audio_path.clone();
        self.db.podcasts.set_audio_path(version_id, &filename).await?;
        if let Some(old) = previous {
            remove_audio_file(&self.audio_dir, &old);
        }

        info!(
            version_id,
            turns = total,
            bytes = combined.len(),
            "Podcast audio synthesized"
        );
        Ok(())
    }
}

/// Delete an audio file by stored filename, tolerating absence.
pub fn remove_audio_file(audio_dir: &Path, filename: &str) {
    let path = audio_dir.join(filename);
    if let Err(e) = std::fs::remove_file(&path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to delete audio file");
        }
    }
}

#[async_trait]
impl TaskHandler for SynthesizeHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Synthesize
    }

    async fn execute(&self, ctx: TaskContext) -> TaskResult {
        let version_id = ctx.entity_id();
        match self.run(&ctx).await {
            Ok(()) => {
                self.publish(version_id, ProgressStage::Complete, 100, "Synthesis complete");
                TaskResult::Success
            }
            Err(e) => {
                let reason = e.to_string();
                self.publish(version_id, ProgressStage::Failed, 0, &reason);
                TaskResult::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_audio_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        remove_audio_file(dir.path(), "missing.wav");
    }

    #[test]
    fn remove_audio_deletes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.wav");
        std::fs::write(&path, b"x").unwrap();
        remove_audio_file(dir.path(), "gone.wav");
        assert!(!path.exists());
    }
}
