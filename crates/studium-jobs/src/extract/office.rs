//! Office document extraction via pandoc.

use tokio::process::Command;
use tracing::debug;

use studium_core::{Error, Result};

use super::{run_cmd, SourceUnit};

/// Extract a Word document as one source unit of paragraphs.
pub async fn extract_docx(file_path: &str) -> Result<Vec<SourceUnit>> {
    let text = pandoc_plain(file_path, "docx").await?;
    if text.trim().is_empty() {
        return Err(Error::Ingestion("document has no extractable text".into()));
    }
    debug!(chars = text.len(), "docx extracted");
    Ok(vec![SourceUnit::text(1, text.trim().to_string())])
}

/// Extract a presentation. Slide separators in the converted output become
/// unit boundaries; without separators the deck is one unit.
pub async fn extract_pptx(file_path: &str) -> Result<Vec<SourceUnit>> {
    let text = pandoc_plain(file_path, "pptx").await?;
    if text.trim().is_empty() {
        return Err(Error::Ingestion("presentation has no extractable text".into()));
    }

    let units: Vec<SourceUnit> = split_slides(&text)
        .into_iter()
        .enumerate()
        .map(|(i, slide)| SourceUnit::text(i + 1, slide))
        .collect();

    debug!(slides = units.len(), "pptx extracted");
    Ok(units)
}

async fn pandoc_plain(file_path: &str, format: &str) -> Result<String> {
    let stdout = run_cmd(
        Command::new("pandoc").args(["-f", format, "-t", "plain", "--wrap=none", file_path]),
        "pandoc",
    )
    .await?;
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

/// Split converted slide text on horizontal-rule separators, falling back
/// to the whole text as one slide.
fn split_slides(text: &str) -> Vec<String> {
    let slides: Vec<String> = text
        .split("\n\n----")
        .flat_map(|part| part.split('\u{c}'))
        .map(|s| s.trim_matches(|c: char| c == '-' || c.is_whitespace()).to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if slides.is_empty() {
        vec![text.trim().to_string()]
    } else {
        slides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_slides_on_rules() {
        let text = "Slide one content\n\n-----\n\nSlide two content";
        let slides = split_slides(text);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0], "Slide one content");
        assert_eq!(slides[1], "Slide two content");
    }

    #[test]
    fn split_slides_on_form_feeds() {
        let text = "First\u{c}Second\u{c}Third";
        assert_eq!(split_slides(text).len(), 3);
    }

    #[test]
    fn unseparated_text_is_one_slide() {
        let slides = split_slides("Just a single block of text");
        assert_eq!(slides.len(), 1);
    }
}
