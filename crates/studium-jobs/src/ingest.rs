//! The ingestion pipeline: file → text and captions → chunks → embeddings
//! → chunk store.
//!
//! Phases run strictly in order and are resumable by re-running from the
//! start: persistence deletes before inserting, so a retry or reprocess is
//! idempotent. The embedding fingerprint is resolved once at task start;
//! settings changes mid-flight do not affect the running task. Cancellation
//! is polled between phases and leaves the document `failed` with zero
//! chunks.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument, warn};

use studium_core::defaults::EMBED_BATCH_SIZE;
use studium_core::{
    ChunkRepository, DocumentRepository, DocumentStatus, EffectiveConfig, EmbeddingBackend,
    Error, FileType, NewChunk, ProgressEvent, ProgressHub, ProgressKey, ProgressStage, Result,
    SettingsRepository, TaskKind, TaskRepository, VisionBackend, WorkspaceRepository,
};
use studium_db::{Chunker, Database, RecursiveChunker};
use studium_inference::BackendSelector;

use crate::extract::{extract_document, ContentBlock, SourceUnit};
use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Placeholder caption for images the vision backend could not read.
const UNREADABLE_IMAGE: &str = "[image: unreadable]";

enum Outcome {
    Completed { chunk_count: usize },
    Cancelled,
}

/// Handler for `ingest` tasks.
pub struct IngestHandler {
    db: Database,
    selector: Arc<BackendSelector>,
    hub: Arc<ProgressHub>,
}

impl IngestHandler {
    pub fn new(db: Database, selector: Arc<BackendSelector>, hub: Arc<ProgressHub>) -> Self {
        Self { db, selector, hub }
    }

    /// Persist the latest progress on the task row and fan it out to any
    /// SSE subscribers for this document.
    fn report(&self, ctx: &TaskContext, stage: ProgressStage, percent: u8, message: &str) {
        ctx.report_progress(percent as i32, Some(message));
        self.hub.publish(
            ProgressKey::Document(ctx.entity_id()),
            ProgressEvent::new(stage, percent, message),
        );
    }

    async fn is_cancelled(&self, ctx: &TaskContext) -> bool {
        self.db
            .tasks
            .cancel_requested(ctx.task.id)
            .await
            .unwrap_or(false)
    }

    #[instrument(skip(self, ctx), fields(subsystem = "jobs", component = "ingest", document_id = ctx.entity_id()))]
    async fn run(&self, ctx: &TaskContext) -> Result<Outcome> {
        let document_id = ctx.entity_id();
        let document = self.db.documents.get(document_id).await?;

        self.db
            .documents
            .set_status(document_id, DocumentStatus::Processing)
            .await?;
        self.report(ctx, ProgressStage::Processing, 5, "Extracting content");

        // Resolve the effective config once; the fingerprint is frozen for
        // the duration of this task.
        let workspace = self.db.workspaces.get(document.workspace_id).await?;
        let settings = self.db.settings.get_or_create().await?;
        let cfg = EffectiveConfig::resolve(&workspace, &settings);
        cfg.require_embeddings()?;
        let embedder = self.selector.embeddings(&cfg).await?;
        let (provider, model) = cfg.embedding_fingerprint();

        if document.file_type == FileType::Image && !cfg.enable_vision_processing {
            return Err(Error::Ingestion(
                "image processing is disabled in settings; enable vision processing \
                 or upload a PDF, Word, or PowerPoint file instead"
                    .into(),
            ));
        }

        // Phase 1: extract.
        let vision = if cfg.enable_vision_processing {
            self.selector.vision(&cfg).ok()
        } else {
            None
        };
        let mut units = extract_document(&document, vision.is_some()).await?;

        if self.is_cancelled(ctx).await {
            return Ok(Outcome::Cancelled);
        }

        // Phase 2: caption images.
        if units.iter().any(|u| u.image_count() > 0) {
            self.report(ctx, ProgressStage::Processing, 25, "Captioning images");
            caption_images(&mut units, vision.as_deref()).await;
        }

        if self.is_cancelled(ctx).await {
            return Ok(Outcome::Cancelled);
        }

        // Phase 3: chunk.
        self.report(ctx, ProgressStage::Processing, 40, "Chunking text");
        let chunker = RecursiveChunker::default();
        let mut contents: Vec<(String, serde_json::Value)> = Vec::new();
        for unit in &units {
            let text = unit_text(unit);
            for chunk in chunker.chunk(&text) {
                let enriched = format!(
                    "Context: {} (Page {})\n\n{}",
                    document.title, unit.index, chunk
                );
                let metadata = json!({"page": unit.index, "source": document.title});
                contents.push((enriched, metadata));
            }
        }
        if contents.is_empty() {
            return Err(Error::Ingestion("no text content could be extracted".into()));
        }

        if self.is_cancelled(ctx).await {
            return Ok(Outcome::Cancelled);
        }

        // Phase 4: embed in batches.
        let total = contents.len();
        let mut chunks: Vec<NewChunk> = Vec::with_capacity(total);
        for (batch_start, batch) in contents.chunks(EMBED_BATCH_SIZE).enumerate().map(|(i, b)| (i * EMBED_BATCH_SIZE, b)) {
            let texts: Vec<String> = batch.iter().map(|(text, _)| text.clone()).collect();
            let vectors = embedder.embed_texts(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::Ingestion(format!(
                    "embedding backend returned {} vectors for {} inputs",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (offset, ((content, metadata), vector)) in
                batch.iter().zip(vectors.into_iter()).enumerate()
            {
                if vector.as_slice().len() != embedder.dimension() {
                    return Err(Error::Ingestion(format!(
                        "embedding dimension {} does not match expected {}",
                        vector.as_slice().len(),
                        embedder.dimension()
                    )));
                }
                chunks.push(NewChunk {
                    ordinal: (batch_start + offset) as i32,
                    content: content.clone(),
                    metadata: metadata.clone(),
                    embedding: vector,
                });
            }

            let done = batch_start + batch.len();
            let percent = 40 + (done * 50 / total) as u8;
            self.report(
                ctx,
                ProgressStage::Processing,
                percent,
                &format!("Embedding chunks ({}/{})", done, total),
            );

            if self.is_cancelled(ctx).await {
                return Ok(Outcome::Cancelled);
            }
        }

        // Phase 5: persist (delete-then-insert, fingerprint, completed).
        self.report(ctx, ProgressStage::Processing, 95, "Persisting chunks");
        self.db
            .chunks
            .replace_for_document(
                document_id,
                document.workspace_id,
                chunks,
                embedder.dimension(),
                &provider,
                &model,
            )
            .await?;

        Ok(Outcome::Completed { chunk_count: total })
    }

    /// Roll back to a clean failed state after cancellation.
    async fn clean_up_cancelled(&self, document_id: i64) {
        if let Err(e) = self.db.chunks.delete_for_document(document_id).await {
            warn!(document_id, error = %e, "Failed to delete chunks after cancellation");
        }
        if let Err(e) = self.db.documents.set_failed(document_id, "cancelled").await {
            warn!(document_id, error = %e, "Failed to mark document cancelled");
        }
    }
}

/// Concatenate a unit's blocks into one text, separating blocks by blank
/// lines. Image blocks must have been captioned already.
fn unit_text(unit: &SourceUnit) -> String {
    unit.blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text(t) if !t.trim().is_empty() => Some(t.trim()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Replace every image block with a caption from the vision backend.
/// Per-image failures become a placeholder and are not fatal.
async fn caption_images(units: &mut [SourceUnit], vision: Option<&dyn VisionBackend>) {
    for unit in units.iter_mut() {
        for block in unit.blocks.iter_mut() {
            let ContentBlock::Image { data, mime } = block else {
                continue;
            };
            let caption = match vision {
                Some(backend) => match backend.describe_image(data, mime).await {
                    Ok(caption) if !caption.trim().is_empty() => caption,
                    Ok(_) => UNREADABLE_IMAGE.to_string(),
                    Err(e) => {
                        warn!(page = unit.index, error = %e, "Image caption failed");
                        UNREADABLE_IMAGE.to_string()
                    }
                },
                None => UNREADABLE_IMAGE.to_string(),
            };
            *block = ContentBlock::Text(caption);
        }
    }
}

#[async_trait]
impl TaskHandler for IngestHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Ingest
    }

    async fn execute(&self, ctx: TaskContext) -> TaskResult {
        let document_id = ctx.entity_id();

        match self.run(&ctx).await {
            Ok(Outcome::Completed { chunk_count }) => {
                self.report(&ctx, ProgressStage::Completed, 100, "Ingestion complete");
                info!(document_id, chunk_count, "Document ingested");
                TaskResult::Success
            }
            Ok(Outcome::Cancelled) => {
                self.clean_up_cancelled(document_id).await;
                self.report(&ctx, ProgressStage::Failed, 0, "cancelled");
                info!(document_id, "Ingestion cancelled");
                TaskResult::Failed("cancelled".to_string())
            }
            Err(e) => {
                let reason = e.to_string();
                if let Err(mark_err) = self.db.documents.set_failed(document_id, &reason).await {
                    warn!(document_id, error = %mark_err, "Failed to mark document failed");
                }
                self.report(&ctx, ProgressStage::Failed, 0, &reason);
                TaskResult::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studium_inference::MockVisionBackend;

    fn image_unit(index: usize) -> SourceUnit {
        SourceUnit {
            index,
            blocks: vec![
                ContentBlock::Text("Intro text".into()),
                ContentBlock::Image {
                    data: vec![1, 2, 3],
                    mime: "image/png".into(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn captioning_replaces_images_with_text() {
        let mut units = vec![image_unit(1)];
        let vision = MockVisionBackend::new("A labeled cell diagram.");
        caption_images(&mut units, Some(&vision)).await;

        assert_eq!(units[0].image_count(), 0);
        let text = unit_text(&units[0]);
        assert!(text.contains("Intro text"));
        assert!(text.contains("A labeled cell diagram."));
    }

    #[tokio::test]
    async fn caption_failure_becomes_placeholder() {
        let mut units = vec![image_unit(2)];
        let vision = MockVisionBackend::failing();
        caption_images(&mut units, Some(&vision)).await;

        assert!(unit_text(&units[0]).contains(UNREADABLE_IMAGE));
    }

    #[tokio::test]
    async fn missing_vision_backend_yields_placeholder() {
        let mut units = vec![image_unit(1)];
        caption_images(&mut units, None).await;
        assert!(unit_text(&units[0]).contains(UNREADABLE_IMAGE));
    }

    #[test]
    fn unit_text_skips_empty_blocks() {
        let unit = SourceUnit {
            index: 1,
            blocks: vec![
                ContentBlock::Text("  ".into()),
                ContentBlock::Text("Real content".into()),
            ],
        };
        assert_eq!(unit_text(&unit), "Real content");
    }
}
