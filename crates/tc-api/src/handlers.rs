//! HTTP API handlers
//!
//! Each handler locks its session for the whole request, so actions on one
//! session never interleave.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tc_core::{Orchestrator, SessionView, UploadedImage};

use crate::error::{ApiError, Result};
use crate::page::INDEX_HTML;
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Returned when a session is created
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Upload result
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether the stored image changed (and results were reset)
    pub replaced: bool,
    pub view: SessionView,
}

/// Identify result; a weather failure does not fail the request
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_error: Option<String>,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// The single-page UI
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// Start a new session
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// Current view of a session
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
    let handle = state.sessions.get(&session_id).await?;
    let session = handle.lock().await;
    Ok(Json(Orchestrator::render(&session)))
}

/// End a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(tc_core::Error::SessionNotFound(session_id).into())
    }
}

/// Store the request body as the session's image
pub async fn upload_image(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidRequest("missing Content-Type".to_string()))?;

    if body.is_empty() {
        return Err(ApiError::InvalidRequest("empty image".to_string()));
    }

    let image = UploadedImage::new(content_type, body.to_vec())?;
    debug!("Upload for {}: {} ({} bytes)", session_id, image.mime_type, image.bytes.len());

    let handle = state.sessions.get(&session_id).await?;
    let mut session = handle.lock().await;
    let replaced = state.orchestrator.upload_image(&mut session, image);

    Ok(Json(UploadResponse {
        replaced,
        view: Orchestrator::render(&session),
    }))
}

/// Identify the uploaded place, then fetch its weather if not shown yet
pub async fn identify(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<IdentifyResponse>> {
    let handle = state.sessions.get(&session_id).await?;
    let mut session = handle.lock().await;

    state.orchestrator.identify_place(&mut session).await?;

    let mut weather_error = None;
    if session.weather.is_none() {
        if let Err(e) = state.orchestrator.fetch_weather(&mut session).await {
            warn!("Weather lookup failed for {}: {}", session_id, e);
            weather_error = Some(e.to_string());
        }
    }

    info!("Identify completed for session {}", session_id);
    Ok(Json(IdentifyResponse {
        view: Orchestrator::render(&session),
        weather_error,
    }))
}

/// Fetch (or refresh) the weather for the identified place
pub async fn weather(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
    let handle = state.sessions.get(&session_id).await?;
    let mut session = handle.lock().await;

    state.orchestrator.fetch_weather(&mut session).await?;
    Ok(Json(Orchestrator::render(&session)))
}
