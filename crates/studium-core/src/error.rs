//! Error types for studium.

use thiserror::Error;

/// Result type alias using studium's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failure classification for provider adapters.
///
/// `rate_limit`, `network`, and `server` are retried with exponential
/// backoff inside the adapter before surfacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Auth,
    RateLimit,
    Network,
    Server,
    BadRequest,
    NotFound,
}

impl ProviderErrorKind {
    /// Whether a failure of this kind is worth retrying.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Server)
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Network => write!(f, "network"),
            Self::Server => write!(f, "server"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::NotFound => write!(f, "not_found"),
        }
    }
}

/// Core error type for studium operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Workspace not found
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(i64),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    /// Malformed or rejected input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Missing or inconsistent provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace mixes documents embedded under different fingerprints
    #[error("Incompatible embeddings: {message}")]
    IncompatibleEmbeddings {
        message: String,
        /// Titles of the documents whose fingerprint differs from the
        /// effective configuration.
        documents: Vec<String>,
    },

    /// Remote provider call failed after classification (and retries, if
    /// the kind was retryable)
    #[error("Provider error ({kind}): {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
    },

    /// LLM output failed schema validation after retries
    #[error("Generation error: {0}")]
    Generation(String),

    /// Document ingestion failed; surfaced via document.error_message
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Task queue error
    #[error("Task error: {0}")]
    Task(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a provider error.
    pub fn provider(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Error::Provider {
            kind,
            message: message.into(),
        }
    }

    /// Whether the error is a retryable provider failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Provider { kind, .. } if kind.retryable())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() || e.is_connect() || e.is_request() {
            ProviderErrorKind::Network
        } else if let Some(status) = e.status() {
            match status.as_u16() {
                401 | 403 => ProviderErrorKind::Auth,
                429 => ProviderErrorKind::RateLimit,
                404 => ProviderErrorKind::NotFound,
                400..=499 => ProviderErrorKind::BadRequest,
                _ => ProviderErrorKind::Server,
            }
        } else {
            ProviderErrorKind::Network
        };
        Error::Provider {
            kind,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("workspace 12".to_string());
        assert_eq!(err.to_string(), "Not found: workspace 12");
    }

    #[test]
    fn test_error_display_document_not_found() {
        let err = Error::DocumentNotFound(42);
        assert_eq!(err.to_string(), "Document not found: 42");
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("empty file".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty file");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("openai_api_key is required".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: openai_api_key is required"
        );
    }

    #[test]
    fn test_error_display_incompatible_embeddings() {
        let err = Error::IncompatibleEmbeddings {
            message: "2 documents use a different embedding model".to_string(),
            documents: vec!["notes.pdf".to_string(), "slides.pptx".to_string()],
        };
        assert!(err.to_string().contains("different embedding model"));
    }

    #[test]
    fn test_error_display_provider() {
        let err = Error::provider(ProviderErrorKind::RateLimit, "429 from upstream");
        assert_eq!(
            err.to_string(),
            "Provider error (rate_limit): 429 from upstream"
        );
    }

    #[test]
    fn test_provider_kind_retryable() {
        assert!(ProviderErrorKind::RateLimit.retryable());
        assert!(ProviderErrorKind::Network.retryable());
        assert!(ProviderErrorKind::Server.retryable());
        assert!(!ProviderErrorKind::Auth.retryable());
        assert!(!ProviderErrorKind::BadRequest.retryable());
        assert!(!ProviderErrorKind::NotFound.retryable());
    }

    #[test]
    fn test_provider_kind_serialization() {
        let json = serde_json::to_string(&ProviderErrorKind::RateLimit).unwrap();
        assert_eq!(json, "\"rate_limit\"");
        let parsed: ProviderErrorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ProviderErrorKind::RateLimit);
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::provider(ProviderErrorKind::Network, "timeout").is_retryable());
        assert!(!Error::provider(ProviderErrorKind::Auth, "bad key").is_retryable());
        assert!(!Error::Generation("schema mismatch".to_string()).is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
