//! Toolbox endpoints
//!
//! The toolbox lists every strategy row: the ones the analysis pipeline
//! suggested plus the user's own additions created here.

use crate::db;
use crate::error::{ApiError, ApiResult, Error};
use crate::models::{Strategy, SuggestedStrategy};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

/// Request body for POST /tools
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToolRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
}

/// GET /tools
pub async fn list_tools(State(state): State<AppState>) -> ApiResult<Json<Vec<Strategy>>> {
    let strategies = db::strategies::list_strategies(&state.db).await?;
    Ok(Json(strategies))
}

/// POST /tools
///
/// **Request:** `{"title": "...", "content": "...", "category": "...",
/// "trigger": "..."}` (category/trigger optional)
///
/// User-authored tool; never marked AI-generated and not tied to an entry.
pub async fn create_tool(
    State(state): State<AppState>,
    Json(payload): Json<NewToolRequest>,
) -> ApiResult<Json<Strategy>> {
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "title and content are required".to_string(),
        ));
    }

    let suggestion = SuggestedStrategy {
        title: payload.title,
        content: payload.content,
        category: payload.category.unwrap_or_else(|| "自訂".to_string()),
        trigger: payload.trigger.unwrap_or_else(|| "日常".to_string()),
    };

    let now = Utc::now();
    let mut conn = state.db.acquire().await.map_err(Error::from)?;
    let id = db::strategies::insert_strategy(&mut conn, &suggestion, false, None, now).await?;
    drop(conn);

    info!(strategy_id = id, "User tool added");

    Ok(Json(Strategy {
        id,
        title: suggestion.title,
        content: suggestion.content,
        category: suggestion.category,
        trigger: suggestion.trigger,
        is_ai_generated: false,
        source_entry_id: None,
        created_at: now,
    }))
}

/// Build tool routes
pub fn tool_routes() -> Router<AppState> {
    Router::new().route("/tools", get(list_tools).post(create_tool))
}
