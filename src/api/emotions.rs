//! Emotion library endpoints
//!
//! Mood statistics for the library page, the per-emotion entry list, and
//! the user-maintained guide for each emotion label.

use crate::db;
use crate::db::entries::MoodCount;
use crate::error::{ApiError, ApiResult};
use crate::models::{EmotionGuide, EntryWithAnalysis};
use crate::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Guide lookup result: the stored guide, or `{"strategy": null}` when
/// none has been written for this emotion yet
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GuideResponse {
    Found(EmotionGuide),
    Missing { strategy: Option<String> },
}

/// Request body for POST /emotions/:tag/guide
#[derive(Debug, Deserialize)]
pub struct SaveGuideRequest {
    pub strategy: String,
}

/// GET /emotions
///
/// Entry counts grouped by mood, most frequent first.
pub async fn emotion_stats(State(state): State<AppState>) -> ApiResult<Json<Vec<MoodCount>>> {
    let counts = db::entries::mood_counts(&state.db).await?;
    Ok(Json(counts))
}

/// GET /emotions/:tag/entries
///
/// Entries carrying the given mood, newest first, analyses embedded.
pub async fn entries_for_emotion(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<Json<Vec<EntryWithAnalysis>>> {
    let entries = db::entries::list_with_analyses_by_mood(&state.db, &tag).await?;
    Ok(Json(entries))
}

/// GET /emotions/:tag/guide
pub async fn get_guide(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<Json<GuideResponse>> {
    let guide = db::guides::get_guide(&state.db, &tag).await?;
    let response = match guide {
        Some(guide) => GuideResponse::Found(guide),
        None => GuideResponse::Missing { strategy: None },
    };
    Ok(Json(response))
}

/// POST /emotions/:tag/guide
///
/// Creates or replaces the guide for this emotion label (idempotent).
///
/// **Errors:**
/// - 400 Bad Request: blank strategy text
pub async fn save_guide(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Json(payload): Json<SaveGuideRequest>,
) -> ApiResult<Json<EmotionGuide>> {
    if payload.strategy.trim().is_empty() {
        return Err(ApiError::BadRequest("strategy is required".to_string()));
    }

    let guide = db::guides::upsert_guide(&state.db, &tag, &payload.strategy).await?;
    Ok(Json(guide))
}

/// Build emotion routes
pub fn emotion_routes() -> Router<AppState> {
    Router::new()
        .route("/emotions", get(emotion_stats))
        .route("/emotions/:tag/entries", get(entries_for_emotion))
        .route("/emotions/:tag/guide", get(get_guide).post(save_guide))
}
