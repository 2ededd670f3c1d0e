//! Settings endpoints
//!
//! The stored Gemini API key is write-only through this surface: reads
//! report whether one exists, never the key itself.

use crate::db;
use crate::error::ApiResult;
use crate::models::UserSettings;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Settings view served to clients; the key never appears here
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub ai_persona: String,
    pub has_gemini_api_key: bool,
}

impl From<UserSettings> for SettingsResponse {
    fn from(settings: UserSettings) -> Self {
        Self {
            ai_persona: settings.ai_persona,
            has_gemini_api_key: settings.gemini_api_key.is_some(),
        }
    }
}

/// Request body for POST /settings; absent fields stay unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSettingsRequest {
    pub ai_persona: Option<String>,
    /// Empty string clears the stored key
    pub gemini_api_key: Option<String>,
}

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<SettingsResponse>> {
    let settings = db::settings::get_settings(&state.db).await?;
    Ok(Json(settings.into()))
}

/// POST /settings
///
/// **Request:** `{"aiPersona": "...", "geminiApiKey": "..."}` (both optional)
///
/// Returns the updated view, which reports `hasGeminiApiKey` instead of
/// echoing the key.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let settings = db::settings::update_settings(
        &state.db,
        payload.ai_persona.as_deref(),
        payload.gemini_api_key.as_deref(),
    )
    .await?;

    if payload.gemini_api_key.is_some() {
        info!(
            has_key = settings.gemini_api_key.is_some(),
            "Gemini API key updated via settings"
        );
    }

    Ok(Json(settings.into()))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).post(update_settings))
}
