//! Re-analysis endpoint

use crate::error::ApiResult;
use crate::models::EntryWithAnalysis;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

/// Request body for POST /analyze
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub entry_id: i64,
}

/// POST /analyze
///
/// **Request:** `{"entryId": 42}`
///
/// Runs the analysis pipeline again over an existing entry, replacing its
/// stored analysis. 404 when the entry doesn't exist.
pub async fn analyze_entry(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<Json<EntryWithAnalysis>> {
    let view = state.analyzer.reanalyze(payload.entry_id).await?;
    Ok(Json(view))
}

/// Build analyze routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_entry))
}
