//! Journal entry endpoints
//!
//! Creation runs the full analysis pipeline; the PATCH handler is the
//! user-correction path for both entry fields and the stored analysis.

use super::ApiQuery;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{AnalysisCorrection, EntryWithAnalysis, NewEntry};
use crate::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Query parameters for GET /entries
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Cap on the number of entries returned (the home feed asks for 3)
    pub limit: Option<i64>,
}

/// Response payload for deletions
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Request body for PATCH /entries/:id; absent fields stay unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateEntryRequest {
    pub content: Option<String>,
    pub mood: Option<String>,
    pub tags: Option<Vec<String>>,
    /// User corrections to the stored analysis
    pub analysis: Option<AnalysisCorrection>,
}

/// GET /entries
///
/// Lists entries newest first, each with its analysis embedded when present.
pub async fn list_entries(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Vec<EntryWithAnalysis>>> {
    let entries = db::entries::list_with_analyses(&state.db, params.limit).await?;
    Ok(Json(entries))
}

/// POST /entries
///
/// **Request:** `{"content": "...", "mood": "...", "tags": [...], "date": "..."}`
/// (only `content` is required)
///
/// Persists the entry and runs the analysis pipeline over it. The entry is
/// always saved; analysis failures degrade to the rule-based fallback and
/// never fail the request.
///
/// **Errors:**
/// - 400 Bad Request: blank content (nothing is persisted)
pub async fn create_entry(
    State(state): State<AppState>,
    Json(payload): Json<NewEntry>,
) -> ApiResult<Json<EntryWithAnalysis>> {
    let view = state.analyzer.create_entry(payload).await?;
    Ok(Json(view))
}

/// PATCH /entries/:id
///
/// Updates entry fields and/or applies user corrections to the analysis,
/// then returns the fresh combined view.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEntryRequest>,
) -> ApiResult<Json<EntryWithAnalysis>> {
    let current = db::entries::get_entry(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entry {id} not found")))?;

    if payload.content.is_some() || payload.mood.is_some() || payload.tags.is_some() {
        let content = payload.content.as_deref().unwrap_or(&current.content);
        if content.trim().is_empty() {
            return Err(ApiError::BadRequest("content cannot be empty".to_string()));
        }
        let mood = payload.mood.as_deref().or(current.mood.as_deref());
        let tags = payload.tags.as_deref().unwrap_or(&current.tags);
        db::entries::update_entry_fields(&state.db, id, content, mood, tags).await?;
        info!(entry_id = id, "Entry fields updated");
    }

    if let Some(correction) = &payload.analysis {
        let applied = db::analyses::apply_correction(&state.db, id, correction).await?;
        if applied {
            info!(entry_id = id, "Analysis correction applied");
        } else {
            warn!(entry_id = id, "Correction ignored: entry has no analysis row");
        }
    }

    let view = db::entries::get_with_analysis(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entry {id} not found")))?;
    Ok(Json(view))
}

/// DELETE /entries/:id
///
/// The analysis row cascades away with the entry; strategy rows keep their
/// text but lose the back-reference.
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = db::entries::delete_entry(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Entry {id} not found")));
    }

    info!(entry_id = id, "Entry deleted");
    Ok(Json(DeleteResponse { success: true }))
}

/// Build entry routes
pub fn entry_routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/:id", patch(update_entry).delete(delete_entry))
}
