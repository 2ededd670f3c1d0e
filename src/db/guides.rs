//! Emotion guide repository
//!
//! One guide per emotion label, maintained by the user from the emotion
//! detail page. Unrelated to the analysis pipeline.

use crate::error::Result;
use crate::models::EmotionGuide;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Load the guide for an emotion label
pub async fn get_guide(pool: &SqlitePool, emotion: &str) -> Result<Option<EmotionGuide>> {
    let row = sqlx::query(
        r#"
        SELECT id, emotion, strategy, updated_at
        FROM emotion_guides
        WHERE emotion = ?
        "#,
    )
    .bind(emotion)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| EmotionGuide {
        id: row.get("id"),
        emotion: row.get("emotion"),
        strategy: row.get("strategy"),
        updated_at: row.get("updated_at"),
    }))
}

/// Create or replace the guide for an emotion label (idempotent by label)
pub async fn upsert_guide(pool: &SqlitePool, emotion: &str, strategy: &str) -> Result<EmotionGuide> {
    sqlx::query(
        r#"
        INSERT INTO emotion_guides (emotion, strategy, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(emotion) DO UPDATE SET
            strategy = excluded.strategy,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(emotion)
    .bind(strategy)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let guide = get_guide(pool, emotion)
        .await?
        .ok_or_else(|| crate::error::Error::Internal("guide missing after upsert".to_string()))?;

    Ok(guide)
}
