//! Podcast generation, version management, and synthesis progress SSE.

use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;

use studium_core::defaults::MAX_PODCAST_VERSIONS;
use studium_core::{PodcastRepository, PodcastType, PodcastVersion, ProgressKey};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PodcastTypeQuery {
    #[serde(rename = "type")]
    pub podcast_type: String,
}

#[derive(Deserialize)]
pub struct GeneratePodcastRequest {
    pub workspace_id: i64,
    pub topic: String,
    pub voice_a: String,
    pub voice_b: Option<String>,
}

#[derive(Deserialize)]
pub struct VersionsQuery {
    pub workspace_id: i64,
    pub topic: String,
    #[serde(rename = "type")]
    pub podcast_type: String,
}

#[derive(Serialize)]
pub struct VersionsResponse {
    pub versions: Vec<PodcastVersion>,
    pub max_versions: i64,
}

fn parse_type(raw: &str) -> Result<PodcastType, ApiError> {
    PodcastType::from_str_loose(raw)
        .ok_or_else(|| ApiError::bad_request(format!("unknown podcast type: {}", raw)))
}

/// `POST /generate/podcast?type={single|duo}`
pub async fn generate_podcast(
    State(state): State<AppState>,
    Query(query): Query<PodcastTypeQuery>,
    Json(req): Json<GeneratePodcastRequest>,
) -> Result<Json<PodcastVersion>, ApiError> {
    let podcast_type = parse_type(&query.podcast_type)?;
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::bad_request("topic must not be empty"));
    }

    let version = state
        .podcasts
        .generate(
            req.workspace_id,
            topic,
            podcast_type,
            &req.voice_a,
            req.voice_b.as_deref(),
        )
        .await?;
    Ok(Json(version))
}

/// `POST /generate/podcast/resynthesize?type=duo`
pub async fn resynthesize_podcast(
    State(state): State<AppState>,
    Query(query): Query<PodcastTypeQuery>,
    Json(req): Json<GeneratePodcastRequest>,
) -> Result<(StatusCode, Json<PodcastVersion>), ApiError> {
    let podcast_type = parse_type(&query.podcast_type)?;
    let version = state
        .podcasts
        .resynthesize(
            req.workspace_id,
            req.topic.trim(),
            podcast_type,
            &req.voice_a,
            req.voice_b.as_deref(),
        )
        .await?;
    Ok((StatusCode::ACCEPTED, Json(version)))
}

/// `GET /podcasts/versions?workspace_id=&topic=&type=`
pub async fn list_versions(
    State(state): State<AppState>,
    Query(query): Query<VersionsQuery>,
) -> Result<Json<VersionsResponse>, ApiError> {
    let podcast_type = parse_type(&query.podcast_type)?;
    let versions = state
        .db
        .podcasts
        .list(query.workspace_id, query.topic.trim(), podcast_type)
        .await?;
    Ok(Json(VersionsResponse {
        versions,
        max_versions: MAX_PODCAST_VERSIONS,
    }))
}

/// `GET /podcasts/{version_id}`
pub async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> Result<Json<PodcastVersion>, ApiError> {
    Ok(Json(state.db.podcasts.get(version_id).await?))
}

/// `DELETE /podcasts/{version_id}`
pub async fn delete_version(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.podcasts.delete_version(version_id).await?;
    state.hub.forget(ProgressKey::PodcastVersion(version_id));
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /podcast/synthesis/progress/{version_id}`
///
/// SSE stream of `{status, progress, message}` events. The last event for
/// the version is replayed immediately on (re)connect; the stream ends
/// after a terminal event.
pub async fn synthesis_progress(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // 404 for unknown versions rather than a silent empty stream.
    state.db.podcasts.get(version_id).await?;

    let key = ProgressKey::PodcastVersion(version_id);
    let (last, rx) = state.hub.subscribe(key);

    let replay = futures::stream::iter(last);
    let live = BroadcastStream::new(rx).filter_map(move |result| {
        futures::future::ready(match result {
            Ok(keyed) if keyed.key == key => Some(keyed.event),
            _ => None,
        })
    });

    let stream = replay
        .chain(live)
        .scan(false, |done, event| {
            if *done {
                return futures::future::ready(None);
            }
            *done = event.is_terminal();
            futures::future::ready(Some(event))
        })
        .filter_map(|event| {
            futures::future::ready(Event::default().json_data(&event).ok().map(Ok))
        });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keepalive"),
    ))
}
