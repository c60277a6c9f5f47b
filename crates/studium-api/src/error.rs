//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`; the response body is
//! always `{"detail": "..."}` with the status from the table in the
//! service's error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use studium_core::{Error, ProviderErrorKind};

/// An API-level error carrying the HTTP status and client-facing detail.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) | Error::WorkspaceNotFound(_) | Error::DocumentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::IncompatibleEmbeddings { .. } => StatusCode::CONFLICT,
            Error::Provider { kind, .. } => match kind {
                ProviderErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ProviderErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                ProviderErrorKind::BadRequest => StatusCode::BAD_REQUEST,
                ProviderErrorKind::NotFound => StatusCode::NOT_FOUND,
                ProviderErrorKind::Network | ProviderErrorKind::Server => StatusCode::BAD_GATEWAY,
            },
            Error::Generation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match &err {
            Error::IncompatibleEmbeddings { message, documents } => {
                format!("{}; affected documents: {}", message, documents.join(", "))
            }
            other => other.to_string(),
        };

        Self { status, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err: ApiError = Error::Validation("bad".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: ApiError = Error::DocumentNotFound(7).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn incompatible_embeddings_maps_to_409_and_names_documents() {
        let err: ApiError = Error::IncompatibleEmbeddings {
            message: "mixed fingerprints".into(),
            documents: vec!["notes.pdf (huggingface/all-MiniLM-L6-v2)".into()],
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.detail.contains("notes.pdf"));
    }

    #[test]
    fn provider_kinds_map_to_statuses() {
        let cases = [
            (ProviderErrorKind::Auth, StatusCode::UNAUTHORIZED),
            (ProviderErrorKind::RateLimit, StatusCode::TOO_MANY_REQUESTS),
            (ProviderErrorKind::Network, StatusCode::BAD_GATEWAY),
            (ProviderErrorKind::Server, StatusCode::BAD_GATEWAY),
            (ProviderErrorKind::BadRequest, StatusCode::BAD_REQUEST),
            (ProviderErrorKind::NotFound, StatusCode::NOT_FOUND),
        ];
        for (kind, status) in cases {
            let err: ApiError = Error::provider(kind, "x").into();
            assert_eq!(err.status, status, "kind {:?}", kind);
        }
    }

    #[test]
    fn generation_maps_to_502() {
        let err: ApiError = Error::Generation("schema".into()).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_maps_to_500() {
        let err: ApiError = Error::Internal("boom".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
