//! Editing session routes.
//!
//! Each session lives in the shared [`SessionStore`](wallpaper_core::SessionStore)
//! and is driven by [`ToolAction`] JSON, image uploads and export requests.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wallpaper_core::{
    validate_surface, CanvasError, CanvasResult, EditingSession, ObjectId, PreparedImage,
    SessionId, ToolAction,
};
use wallpaper_renderer::{DecodingProbe, ExportFormat, SceneExporter};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::metrics as server_metrics;
use crate::AppState;

/// Surface size used when a session is created without one.
pub const DEFAULT_SURFACE: (f32, f32) = (1280.0, 720.0);
/// Body limit for image uploads, a little above the core upload limit.
pub const UPLOAD_BODY_LIMIT: usize = wallpaper_core::MAX_UPLOAD_BYTES + 1024 * 1024;

/// Optional body of `POST /api/sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSession {
    /// Surface width in pixels.
    pub width: Option<f32>,
    /// Surface height in pixels.
    pub height: Option<f32>,
}

/// Body of `POST /api/sessions/{id}/data-uri`.
#[derive(Debug, Deserialize)]
pub struct DataUriUpload {
    /// Base64 image data URI, e.g. a generated wallpaper.
    #[serde(rename = "dataUri")]
    pub data_uri: String,
}

/// Query of `GET /api/sessions/{id}/export`.
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    /// Output format (default png).
    pub format: Option<ExportFormat>,
}

/// Response carrying a session's ID and current view.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Session ID.
    pub id: String,
    /// Serialized [`SessionView`](wallpaper_core::SessionView).
    pub session: Value,
}

fn parse_id(raw: &str) -> Result<SessionId, ApiError> {
    Ok(raw.parse::<SessionId>()?)
}

fn view_json(session: &EditingSession) -> CanvasResult<Value> {
    Ok(serde_json::to_value(session.view())?)
}

fn compact_view_json(session: &EditingSession) -> CanvasResult<Value> {
    Ok(serde_json::to_value(session.compact_view())?)
}

/// 404 before any per-byte work is spent on a request for a missing session.
fn ensure_exists(state: &AppState, id: SessionId) -> Result<(), ApiError> {
    if state.sessions.contains(id) {
        Ok(())
    } else {
        Err(CanvasError::SessionNotFound(id.to_string()).into())
    }
}

/// Validate, measure and encode image bytes off the async runtime.
async fn prepare<F>(work: F) -> Result<CanvasResult<PreparedImage>, ApiError>
where
    F: FnOnce() -> CanvasResult<PreparedImage> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn session_response(id: SessionId, session: Value) -> SessionResponse {
    SessionResponse {
        id: id.to_string(),
        session,
    }
}

/// Open a new editing session.
#[tracing::instrument(name = "create_session", skip(state, body))]
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let request: CreateSession = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSession::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };
    let width = request.width.unwrap_or(DEFAULT_SURFACE.0);
    let height = request.height.unwrap_or(DEFAULT_SURFACE.1);
    validate_surface(width, height)?;

    let id = state.sessions.create(width, height)?;
    server_metrics::set_active_sessions(state.sessions.count());
    let view = state.sessions.with_session(id, |s| view_json(s))?;
    Ok((StatusCode::CREATED, Json(session_response(id, view))))
}

/// Current view of a session, including image data URIs.
#[tracing::instrument(name = "get_session", skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.sessions.with_session(id, |s| view_json(s))?;
    Ok(Json(session_response(id, view)))
}

/// Tear down and remove a session.
#[tracing::instrument(name = "delete_session", skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(parse_id(&id)?)?;
    server_metrics::set_active_sessions(state.sessions.count());
    Ok(StatusCode::NO_CONTENT)
}

/// Dispatch a tool action.
///
/// The response carries the outcome and a compact view without image data
/// URIs.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:9474/api/sessions/$ID/actions \
///   -H "Content-Type: application/json" \
///   -d '{"action": "flip", "axis": "horizontal"}'
/// ```
#[tracing::instrument(name = "dispatch_action", skip(state, action))]
pub async fn dispatch_action(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(action): ApiJson<ToolAction>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let name = action.name();
    tracing::debug!(action = name, "Dispatching editor action");
    let result = state.sessions.with_session(id, |s| {
        let outcome = s.dispatch(action)?;
        Ok(serde_json::json!({
            "outcome": outcome,
            "session": compact_view_json(s)?,
        }))
    });
    server_metrics::record_editor_action(name, result.is_ok());
    Ok(Json(result?))
}

/// Upload an image as the raw request body.
///
/// The `Content-Type` header names the image type; anything other than
/// JPEG, PNG or WebP is rejected with a notice. The image is validated and
/// encoded before the session is locked.
#[tracing::instrument(name = "upload_image", skip(state, headers, body))]
pub async fn upload_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    tracing::debug!(%mime, size = body.len(), "Received image upload");
    ensure_exists(&state, id)?;

    let prepared =
        prepare(move || PreparedImage::from_upload(&mime, &body, &DecodingProbe)).await?;
    let result = state.sessions.with_session(id, |s| {
        let object = s.add_prepared(prepared)?;
        added_json(object, s)
    });
    server_metrics::record_editor_action("upload", result.is_ok());
    Ok(Json(result?))
}

/// Add an image given as a data URI, such as a generated wallpaper.
#[tracing::instrument(name = "add_data_uri", skip(state, upload))]
pub async fn add_data_uri(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(upload): ApiJson<DataUriUpload>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    ensure_exists(&state, id)?;

    let prepared =
        prepare(move || PreparedImage::from_data_uri(&upload.data_uri, &DecodingProbe)).await?;
    let result = state.sessions.with_session(id, |s| {
        let object = s.add_prepared(prepared)?;
        added_json(object, s)
    });
    server_metrics::record_editor_action("add_data_uri", result.is_ok());
    Ok(Json(result?))
}

fn added_json(object: ObjectId, session: &EditingSession) -> CanvasResult<Value> {
    Ok(serde_json::json!({
        "objectId": object,
        "session": compact_view_json(session)?,
    }))
}

/// Dismiss a notice.
#[tracing::instrument(name = "dismiss_notice", skip(state))]
pub async fn dismiss_notice(
    State(state): State<AppState>,
    ApiPath((id, notice_id)): ApiPath<(String, u32)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let dismissed = state
        .sessions
        .with_session(id, |s| Ok(s.dismiss_notice(notice_id)))?;
    if dismissed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Notice not found: {notice_id}")))
    }
}

/// Export the scene for download.
///
/// # Example
///
/// ```text
/// curl -o wallpaper.jpg "http://localhost:9474/api/sessions/$ID/export?format=jpeg"
/// ```
#[tracing::instrument(name = "export_session", skip(state))]
pub async fn export_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<ExportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let format = params.format.unwrap_or_default();
    let scene = state.sessions.with_session(id, |s| Ok(s.scene().clone()))?;

    // Rasterization is CPU bound.
    let bytes = tokio::task::spawn_blocking(move || {
        SceneExporter::with_defaults().export(&scene, format)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    server_metrics::record_editor_action("export", true);

    let disposition = format!("attachment; filename=\"wallpaper.{}\"", format.extension());
    Ok((
        [
            (header::CONTENT_TYPE, format.mime().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
