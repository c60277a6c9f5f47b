//! Upload validation and filename sanitization.

use crate::error::{Error, Result};
use crate::models::FileType;

/// Maximum filename length (ext4/NTFS compatible).
const FILENAME_MAX_LENGTH: usize = 255;

/// Sanitize a client-supplied filename for storage on disk.
///
/// Strips path components, replaces characters outside
/// `[A-Za-z0-9._-]` with `_`, and bounds the length.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Avoid hidden files and empty names.
    while sanitized.starts_with('.') {
        sanitized.remove(0);
    }
    if sanitized.is_empty() {
        sanitized = "upload".to_string();
    }
    if sanitized.len() > FILENAME_MAX_LENGTH {
        sanitized.truncate(FILENAME_MAX_LENGTH);
    }
    sanitized
}

/// Validate an uploaded file, returning its detected type.
pub fn validate_upload(filename: &str, data: &[u8]) -> Result<FileType> {
    if data.is_empty() {
        return Err(Error::Validation("uploaded file is empty".into()));
    }
    FileType::from_filename(filename).ok_or_else(|| {
        Error::Validation(format!(
            "unsupported file type: {} (expected pdf, docx, pptx, or an image)",
            filename
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\x\\doc.pdf"), "doc.pdf");
    }

    #[test]
    fn sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn sanitize_rejects_hidden_and_empty() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn validate_rejects_empty_file() {
        let err = validate_upload("notes.pdf", &[]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn validate_rejects_unknown_extension() {
        assert!(validate_upload("data.csv", b"a,b").is_err());
    }

    #[test]
    fn validate_accepts_supported_types() {
        assert_eq!(validate_upload("a.pdf", b"x").unwrap(), FileType::Pdf);
        assert_eq!(validate_upload("a.docx", b"x").unwrap(), FileType::Docx);
        assert_eq!(validate_upload("a.pptx", b"x").unwrap(), FileType::Pptx);
        assert_eq!(validate_upload("a.png", b"x").unwrap(), FileType::Image);
    }
}
