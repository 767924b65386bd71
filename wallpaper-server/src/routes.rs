//! Photo proxy and image generation route handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::validation::{clamp_page, clamp_per_page, validate_prompt, validate_query};
use crate::AppState;

/// Paging parameters for the curated feed.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Results per page.
    pub per_page: Option<u32>,
}

/// Parameters for keyword search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search keywords.
    pub query: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Results per page.
    pub per_page: Option<u32>,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Text prompt describing the wallpaper.
    pub prompt: Option<String>,
}

/// Response of `POST /api/generate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated image as a data URI.
    #[serde(rename = "imageDataUri")]
    pub image_data_uri: String,
}

/// Curated photo feed.
///
/// # Example
///
/// ```text
/// curl "http://localhost:9474/api/photos/curated?page=1&per_page=30"
/// ```
#[tracing::instrument(name = "curated_photos", skip(state))]
pub async fn curated_photos(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let page = clamp_page(params.page);
    let per_page = clamp_per_page(params.per_page);
    Ok(Json(state.photos.curated(page, per_page).await?))
}

/// Keyword photo search.
///
/// # Example
///
/// ```text
/// curl "http://localhost:9474/api/photos/search?query=nature&page=2"
/// ```
#[tracing::instrument(name = "search_photos", skip(state))]
pub async fn search_photos(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = validate_query(params.query.as_deref())?;
    let page = clamp_page(params.page);
    let per_page = clamp_per_page(params.per_page);
    Ok(Json(state.photos.search(query, page, per_page).await?))
}

/// Single photo by ID.
#[tracing::instrument(name = "get_photo", skip(state))]
pub async fn get_photo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.photos.photo(id).await?))
}

/// Generate a wallpaper from a text prompt.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:9474/api/generate \
///   -H "Content-Type: application/json" \
///   -d '{"prompt": "misty mountains at dawn"}'
/// ```
#[tracing::instrument(name = "generate_image", skip(state, request))]
pub async fn generate_image(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let prompt = validate_prompt(request.prompt.as_deref())?;
    let image_data_uri = state.generator.generate(prompt).await?;
    Ok(Json(GenerateResponse { image_data_uri }))
}
