//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::error::ServerError;
use super::tilejson::TileJson;
use super::AppState;
use crate::coord::{CoverageRequest, GeoPoint, TileCoord};
use crate::scheduler::{JobId, JobStatus};
use crate::store::{StoreMetadata, TILE_EXTENSION};

/// Body of `POST /preload`. `size` is the side length in meters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PreloadBody {
    pub lat: f64,
    pub lon: f64,
    pub size: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl From<PreloadBody> for CoverageRequest {
    fn from(body: PreloadBody) -> Self {
        CoverageRequest::new(
            GeoPoint::new(body.lat, body.lon),
            body.size,
            body.min_zoom,
            body.max_zoom,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct PreloadResponse {
    pub status: &'static str,
    pub job_id: JobId,
    pub total: u64,
}

/// Parses the `{z}/{x}/{y}.png` path segments, or `None` if they cannot
/// name a tile.
fn parse_tile_path(z: &str, x: &str, y: &str) -> Option<TileCoord> {
    let y = y.strip_suffix(TILE_EXTENSION)?.strip_suffix('.')?;
    let tile = TileCoord::new(z.parse().ok()?, x.parse().ok()?, y.parse().ok()?);
    tile.is_valid().then_some(tile)
}

pub async fn get_tile(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    let tile = parse_tile_path(&z, &x, &y).ok_or(ServerError::NotFound)?;

    let store = state.store.clone();
    let data = tokio::task::spawn_blocking(move || store.read(&tile)).await??;
    debug!(tile = %tile, bytes = data.len(), "Serving tile");

    Ok(([(header::CONTENT_TYPE, "image/png")], data))
}

pub async fn post_preload(
    State(state): State<AppState>,
    body: Result<Json<PreloadBody>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Json(body) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let manager = state.manager.clone();
    let status = tokio::task::spawn_blocking(move || manager.submit(body.into())).await??;
    let job_id = status
        .job_id
        .ok_or_else(|| ServerError::Internal("submitted job has no id".to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PreloadResponse {
            status: "started",
            job_id,
            total: status.total,
        }),
    ))
}

pub async fn get_status(State(state): State<AppState>) -> Json<JobStatus> {
    Json(state.manager.status())
}

pub async fn post_cancel(State(state): State<AppState>) -> Json<Value> {
    match state.manager.cancel() {
        Some(job_id) => Json(json!({ "status": "cancelling", "job_id": job_id })),
        None => Json(json!({ "status": "idle" })),
    }
}

pub async fn get_metadata(
    State(state): State<AppState>,
) -> Result<Json<StoreMetadata>, ServerError> {
    let store = state.store.clone();
    let metadata = tokio::task::spawn_blocking(move || store.metadata()).await?;
    Ok(Json(metadata))
}

pub async fn get_tilejson(State(state): State<AppState>) -> Result<Json<TileJson>, ServerError> {
    let store = state.store.clone();
    let metadata = tokio::task::spawn_blocking(move || store.metadata()).await?;
    Ok(Json(TileJson::build(&state.tilejson, &metadata)))
}
