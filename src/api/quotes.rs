//! Quote endpoints

use super::ApiQuery;
use crate::api::entries::DeleteResponse;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::Quote;
use crate::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

/// Request body for POST /quotes
#[derive(Debug, Deserialize)]
pub struct NewQuoteRequest {
    pub content: String,
    /// Attribution; absent means unknown
    #[serde(default)]
    pub author: Option<String>,
}

/// Query parameters for DELETE /quotes
#[derive(Debug, Deserialize)]
pub struct DeleteQuoteParams {
    pub id: i64,
}

/// GET /quotes
pub async fn list_quotes(State(state): State<AppState>) -> ApiResult<Json<Vec<Quote>>> {
    let quotes = db::quotes::list_quotes(&state.db).await?;
    Ok(Json(quotes))
}

/// POST /quotes
///
/// **Request:** `{"content": "...", "author": "..."}` (`author` optional,
/// defaults to 未知)
pub async fn create_quote(
    State(state): State<AppState>,
    Json(payload): Json<NewQuoteRequest>,
) -> ApiResult<Json<Quote>> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("內容必填".to_string()));
    }

    let source = payload
        .author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or("未知");
    let quote = db::quotes::insert_quote(&state.db, &payload.content, source).await?;
    Ok(Json(quote))
}

/// DELETE /quotes?id=N
pub async fn delete_quote(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DeleteQuoteParams>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = db::quotes::delete_quote(&state.db, params.id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Quote {} not found", params.id)));
    }
    Ok(Json(DeleteResponse { success: true }))
}

/// GET /quotes/random
///
/// One quote picked at random; 404 while the table is empty.
pub async fn random_quote(State(state): State<AppState>) -> ApiResult<Json<Quote>> {
    let quote = db::quotes::random_quote(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("No quotes available".to_string()))?;
    Ok(Json(quote))
}

/// Build quote routes
pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/quotes",
            get(list_quotes).post(create_quote).delete(delete_quote),
        )
        .route("/quotes/random", get(random_quote))
}
