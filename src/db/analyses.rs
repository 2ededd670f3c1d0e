//! Analysis repository
//!
//! One analysis per entry, enforced by the unique key on `entry_id` and
//! written through the upsert below. Owns the `emotion_tags`, `patterns`,
//! and `custom_insights` JSON-blob columns.

use super::{decode_string_list, decode_string_map};
use crate::error::Result;
use crate::models::{Analysis, AnalysisCorrection, AnalysisOutcome};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Create or replace the analysis for an entry
///
/// Runs inside the pipeline transaction; `created_at` survives a replace,
/// `updated_at` moves.
pub async fn upsert_analysis(
    conn: &mut SqliteConnection,
    entry_id: i64,
    outcome: &AnalysisOutcome,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analyses (
            entry_id, summary, mood_score, emotion_tags, patterns, connections,
            custom_insights, ai_reply, is_ai_generated, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(entry_id) DO UPDATE SET
            summary = excluded.summary,
            mood_score = excluded.mood_score,
            emotion_tags = excluded.emotion_tags,
            patterns = excluded.patterns,
            connections = excluded.connections,
            custom_insights = excluded.custom_insights,
            ai_reply = excluded.ai_reply,
            is_ai_generated = excluded.is_ai_generated,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(entry_id)
    .bind(&outcome.summary)
    .bind(outcome.mood_score)
    .bind(serde_json::to_string(&outcome.emotion_tags)?)
    .bind(serde_json::to_string(&outcome.patterns)?)
    .bind(&outcome.connections)
    .bind(serde_json::to_string(&outcome.custom_insights)?)
    .bind(&outcome.ai_reply)
    .bind(outcome.ai_generated)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Load the analysis belonging to an entry
pub async fn get_for_entry(pool: &SqlitePool, entry_id: i64) -> Result<Option<Analysis>> {
    let row = sqlx::query(
        r#"
        SELECT id, entry_id, summary, mood_score, emotion_tags, patterns,
               connections, custom_insights, ai_reply, is_ai_generated,
               created_at, updated_at
        FROM analyses
        WHERE entry_id = ?
        "#,
    )
    .bind(entry_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| analysis_from_row(&row)))
}

/// Apply a user correction to an existing analysis
///
/// Returns false when the entry has no analysis row to correct.
pub async fn apply_correction(
    pool: &SqlitePool,
    entry_id: i64,
    correction: &AnalysisCorrection,
) -> Result<bool> {
    let Some(current) = get_for_entry(pool, entry_id).await? else {
        return Ok(false);
    };

    let summary = correction.summary.as_ref().unwrap_or(&current.summary);
    let emotion_tags = correction
        .emotion_tags
        .as_ref()
        .unwrap_or(&current.emotion_tags);
    let connections = correction
        .connections
        .as_ref()
        .or(current.connections.as_ref());
    let custom_insights = correction
        .custom_insights
        .as_ref()
        .unwrap_or(&current.custom_insights);

    sqlx::query(
        r#"
        UPDATE analyses
        SET summary = ?, emotion_tags = ?, connections = ?,
            custom_insights = ?, updated_at = ?
        WHERE entry_id = ?
        "#,
    )
    .bind(summary)
    .bind(serde_json::to_string(emotion_tags)?)
    .bind(connections)
    .bind(serde_json::to_string(custom_insights)?)
    .bind(Utc::now())
    .bind(entry_id)
    .execute(pool)
    .await?;

    Ok(true)
}

fn analysis_from_row(row: &sqlx::sqlite::SqliteRow) -> Analysis {
    let emotion_tags: String = row.get("emotion_tags");
    let patterns: String = row.get("patterns");
    let custom_insights: String = row.get("custom_insights");
    Analysis {
        id: row.get("id"),
        entry_id: row.get("entry_id"),
        summary: row.get("summary"),
        mood_score: row.get("mood_score"),
        emotion_tags: decode_string_list(&emotion_tags),
        patterns: decode_string_list(&patterns),
        connections: row.get("connections"),
        custom_insights: decode_string_map(&custom_insights),
        ai_reply: row.get("ai_reply"),
        is_ai_generated: row.get("is_ai_generated"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
