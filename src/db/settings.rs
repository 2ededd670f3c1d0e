//! User settings repository
//!
//! Single-user model: the first row is authoritative (seeded at schema
//! init, so reads never miss). The stored Gemini key is served only to
//! the pipeline, never echoed through the API.

use crate::error::{Error, Result};
use crate::models::UserSettings;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Load the authoritative settings row
pub async fn get_settings(pool: &SqlitePool) -> Result<UserSettings> {
    let row = sqlx::query(
        r#"
        SELECT id, ai_persona, gemini_api_key, updated_at
        FROM user_settings
        ORDER BY id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(UserSettings {
            id: row.get("id"),
            ai_persona: row.get("ai_persona"),
            gemini_api_key: row.get("gemini_api_key"),
            updated_at: row.get("updated_at"),
        }),
        None => Err(Error::Internal("user_settings row missing".to_string())),
    }
}

/// Update the settings row; absent fields stay unchanged
///
/// An empty-string key clears the stored key (the settings page's way of
/// removing it).
pub async fn update_settings(
    pool: &SqlitePool,
    ai_persona: Option<&str>,
    gemini_api_key: Option<&str>,
) -> Result<UserSettings> {
    let current = get_settings(pool).await?;

    let persona = ai_persona.unwrap_or(&current.ai_persona);
    let key = match gemini_api_key {
        Some("") => None,
        Some(k) => Some(k.to_string()),
        None => current.gemini_api_key.clone(),
    };

    sqlx::query(
        r#"
        UPDATE user_settings
        SET ai_persona = ?, gemini_api_key = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(persona)
    .bind(&key)
    .bind(Utc::now())
    .bind(current.id)
    .execute(pool)
    .await?;

    get_settings(pool).await
}
