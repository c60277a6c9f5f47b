//! Image extraction: the file itself is the single content item.

use studium_core::{Error, Result};

use super::{ContentBlock, SourceUnit};

/// Load an image file as a single source unit with one image block.
pub async fn extract(file_path: &str) -> Result<Vec<SourceUnit>> {
    let data = tokio::fs::read(file_path).await.map_err(Error::Io)?;
    if data.is_empty() {
        return Err(Error::Ingestion("image file is empty".into()));
    }
    let mime = mime_from_path(file_path);

    Ok(vec![SourceUnit {
        index: 1,
        blocks: vec![ContentBlock::Image { data, mime }],
    }])
}

fn mime_from_path(path: &str) -> String {
    match path.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mime_detection() {
        assert_eq!(mime_from_path("a/b/fig.png"), "image/png");
        assert_eq!(mime_from_path("photo.JPG"), "image/jpeg");
        assert_eq!(mime_from_path("pic.webp"), "image/webp");
        assert_eq!(mime_from_path("noext"), "image/jpeg");
    }

    #[tokio::test]
    async fn extract_reads_file_as_single_unit() {
        let mut file = tempfile::NamedTempFile::with_suffix(".png").unwrap();
        file.write_all(b"\x89PNGfake").unwrap();

        let units = extract(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].image_count(), 1);
    }

    #[tokio::test]
    async fn extract_rejects_empty_file() {
        let file = tempfile::NamedTempFile::with_suffix(".png").unwrap();
        assert!(extract(file.path().to_str().unwrap()).await.is_err());
    }
}
