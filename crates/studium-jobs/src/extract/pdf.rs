//! PDF extraction via poppler-utils.
//!
//! `pdftotext -layout` emits form feeds between pages; splitting on them
//! recovers per-page text. When images are requested, `pdfimages -p -png`
//! exports embedded images with the page number encoded in the filename
//! (`prefix-PPP-NNN.png`), which lets captions land on the right page.

use tokio::process::Command;
use tracing::{debug, warn};

use studium_core::{Error, Result};

use super::{run_cmd, ContentBlock, SourceUnit};

/// Extract per-page text (and optionally embedded images) from a PDF.
pub async fn extract(file_path: &str, with_images: bool) -> Result<Vec<SourceUnit>> {
    let stdout = run_cmd(
        Command::new("pdftotext").args(["-layout", file_path, "-"]),
        "pdftotext",
    )
    .await?;
    let text = String::from_utf8_lossy(&stdout);

    let mut units: Vec<SourceUnit> = text
        .split('\u{c}')
        .enumerate()
        .map(|(i, page)| SourceUnit::text(i + 1, page.trim().to_string()))
        .collect();

    // Drop a trailing empty page produced by the final form feed.
    if let Some(last) = units.last() {
        if matches!(&last.blocks[0], ContentBlock::Text(t) if t.is_empty()) {
            units.pop();
        }
    }
    if units.is_empty() {
        return Err(Error::Ingestion("PDF has no extractable text".into()));
    }

    if with_images {
        if let Err(e) = attach_images(file_path, &mut units).await {
            // Image extraction is best-effort; the text pipeline continues.
            warn!(error = %e, "PDF image extraction failed, continuing with text only");
        }
    }

    debug!(
        pages = units.len(),
        images = units.iter().map(SourceUnit::image_count).sum::<usize>(),
        "PDF extracted"
    );
    Ok(units)
}

/// Export embedded images and attach them to their pages.
async fn attach_images(file_path: &str, units: &mut [SourceUnit]) -> Result<()> {
    let dir = tempfile::tempdir().map_err(Error::Io)?;
    let prefix = dir.path().join("img");
    let prefix_str = prefix.to_string_lossy().to_string();

    run_cmd(
        Command::new("pdfimages").args(["-p", "-png", file_path, &prefix_str]),
        "pdfimages",
    )
    .await?;

    let mut entries: Vec<_> = std::fs::read_dir(dir.path())
        .map_err(Error::Io)?
        .flatten()
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let Some(page) = page_from_image_name(&name.to_string_lossy()) else {
            continue;
        };
        let data = std::fs::read(entry.path()).map_err(Error::Io)?;
        if let Some(unit) = units.iter_mut().find(|u| u.index == page) {
            unit.blocks.push(ContentBlock::Image {
                data,
                mime: "image/png".to_string(),
            });
        }
    }

    Ok(())
}

/// Parse the page number out of a `pdfimages -p` filename like
/// `img-012-003.png`.
fn page_from_image_name(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(".png")?;
    let mut parts = stem.rsplitn(3, '-');
    let _image_index = parts.next()?;
    let page = parts.next()?;
    page.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_is_parsed_from_filename() {
        assert_eq!(page_from_image_name("img-012-003.png"), Some(12));
        assert_eq!(page_from_image_name("img-001-000.png"), Some(1));
        assert_eq!(page_from_image_name("other.txt"), None);
        assert_eq!(page_from_image_name("img.png"), None);
    }
}
