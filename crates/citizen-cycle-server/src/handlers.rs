//! REST endpoint handlers for the feed server.
//!
//! All handlers read and write the in-memory store in [`AppState`].

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use citizen_cycle_types::{WorldId, now_millis};
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, ReportRequest};

/// Decode a world id from the request path.
fn world_from_path(path: Result<Path<u32>, PathRejection>) -> Result<WorldId, ApiError> {
    path.map(|Path(id)| WorldId::new(id))
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

// ---------------------------------------------------------------------------
// GET /api/citizens
// ---------------------------------------------------------------------------

/// Return every tracked world as a JSON array of feed records.
pub async fn list_citizens(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.all().await)
}

// ---------------------------------------------------------------------------
// GET /api/citizens/{world}
// ---------------------------------------------------------------------------

/// Return one world's record, or 404.
pub async fn get_citizen(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let world = world_from_path(path)?;
    state.get(world).await.map(Json).ok_or(ApiError::NotFound)
}

// ---------------------------------------------------------------------------
// POST /api/citizens
// ---------------------------------------------------------------------------

/// Record a distraction report and echo the stored record.
pub async fn report_citizen(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (Some(world), Some(distracted)) = (request.world, request.distracted) else {
        return Err(ApiError::MissingFields);
    };

    let now = now_millis();
    let record = state
        .report(
            world,
            distracted,
            request.player_name.as_deref(),
            request.timestamp,
            now,
        )
        .await;

    if distracted {
        info!(%world, reported_by = ?record.reported_by, "world distracted");
    } else {
        let since_end = (record.distraction_end_time != 0)
            .then_some(record.distraction_end_time)
            .and_then(|end| now.saturating_sub(end).checked_div(1000));
        info!(%world, ?since_end, reported_by = ?record.reported_by, "world not distracted");
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "data": record,
    })))
}

// ---------------------------------------------------------------------------
// DELETE /api/citizens/{world}
// ---------------------------------------------------------------------------

/// Forget one world, or 404 if it was not tracked.
pub async fn delete_citizen(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u32>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let world = world_from_path(path)?;
    if !state.remove(world).await {
        return Err(ApiError::NotFound);
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Removed data for world {world}"),
    })))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness, tracked world count, and uptime in seconds.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "worldsTracked": state.len().await,
        "uptime": state.uptime().as_secs(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/stats
// ---------------------------------------------------------------------------

/// Distracted and not-distracted world counts.
pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.stats().await;
    Json(serde_json::json!({
        "totalWorlds": stats.total,
        "distractedWorlds": stats.distracted,
        "notDistractedWorlds": stats.total.saturating_sub(stats.distracted),
    }))
}
