//! Content extraction: file → ordered source units of text and images.
//!
//! PDF text comes from `pdftotext` (poppler-utils) with form-feed page
//! splitting; embedded PDF images come from `pdfimages` when vision is
//! enabled. Office documents go through `pandoc`. All external commands
//! are guarded by a per-command timeout.

pub mod image;
pub mod office;
pub mod pdf;

use std::time::Duration;

use tokio::process::Command;

use studium_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use studium_core::{Document, Error, FileType, Result};

/// One block of extracted content.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text(String),
    Image { data: Vec<u8>, mime: String },
}

/// One page or slide of extracted content, in document order.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// 1-based page/slide index.
    pub index: usize,
    pub blocks: Vec<ContentBlock>,
}

impl SourceUnit {
    pub fn text(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            blocks: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Count of image blocks in this unit.
    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::Image { .. }))
            .count()
    }
}

/// Extract a document into ordered source units. `with_images` controls
/// whether embedded images are pulled out (they are only useful when a
/// vision backend will caption them).
pub async fn extract_document(document: &Document, with_images: bool) -> Result<Vec<SourceUnit>> {
    match document.file_type {
        FileType::Pdf => pdf::extract(&document.file_path, with_images).await,
        FileType::Docx => office::extract_docx(&document.file_path).await,
        FileType::Pptx => office::extract_pptx(&document.file_path).await,
        FileType::Image => image::extract(&document.file_path).await,
    }
}

/// Run a command with the extraction timeout, returning stdout bytes.
pub(crate) async fn run_cmd(cmd: &mut Command, what: &str) -> Result<Vec<u8>> {
    let output = tokio::time::timeout(
        Duration::from_secs(EXTRACTION_CMD_TIMEOUT_SECS),
        cmd.output(),
    )
    .await
    .map_err(|_| {
        Error::Ingestion(format!(
            "{} timed out after {}s",
            what, EXTRACTION_CMD_TIMEOUT_SECS
        ))
    })?
    .map_err(|e| Error::Ingestion(format!("failed to run {}: {}", what, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Ingestion(format!(
            "{} failed (exit {}): {}",
            what,
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unit_counts_images() {
        let unit = SourceUnit {
            index: 1,
            blocks: vec![
                ContentBlock::Text("hello".into()),
                ContentBlock::Image {
                    data: vec![1, 2, 3],
                    mime: "image/png".into(),
                },
            ],
        };
        assert_eq!(unit.image_count(), 1);
    }

    #[test]
    fn text_constructor() {
        let unit = SourceUnit::text(3, "slide text");
        assert_eq!(unit.index, 3);
        assert_eq!(unit.blocks.len(), 1);
        assert!(matches!(&unit.blocks[0], ContentBlock::Text(t) if t == "slide text"));
    }
}
