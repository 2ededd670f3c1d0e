//! Entry repository
//!
//! Owns the `tags` JSON-blob column: callers pass and receive
//! `Vec<String>`, never raw blob text.

use super::{decode_string_list, decode_string_map};
use crate::error::Result;
use crate::models::{Analysis, Entry, EntryWithAnalysis};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Per-mood entry count for the emotion library
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}

/// Insert a new entry, returning its id
pub async fn insert_entry(
    pool: &SqlitePool,
    content: &str,
    mood: Option<&str>,
    tags: &[String],
    created_at: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO entries (content, mood, tags, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(content)
    .bind(mood)
    .bind(serde_json::to_string(tags)?)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load one entry by id
pub async fn get_entry(pool: &SqlitePool, id: i64) -> Result<Option<Entry>> {
    let row = sqlx::query(
        r#"
        SELECT id, content, mood, tags, created_at
        FROM entries
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| entry_from_row(&row)))
}

/// List entries newest first, optionally capped (home feed uses a small cap)
pub async fn list_entries(pool: &SqlitePool, limit: Option<i64>) -> Result<Vec<Entry>> {
    let rows = match limit {
        Some(n) => {
            sqlx::query(
                r#"
                SELECT id, content, mood, tags, created_at
                FROM entries
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(n)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, content, mood, tags, created_at
                FROM entries
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.iter().map(entry_from_row).collect())
}

/// Most recent entries for context assembly, excluding the entry being
/// created (when it is already persisted)
pub async fn list_recent_excluding(
    pool: &SqlitePool,
    exclude_entry_id: Option<i64>,
    limit: i64,
) -> Result<Vec<Entry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, content, mood, tags, created_at
        FROM entries
        WHERE id != ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(exclude_entry_id.unwrap_or(-1))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(entry_from_row).collect())
}

/// List entries together with their analyses, newest first
pub async fn list_with_analyses(
    pool: &SqlitePool,
    limit: Option<i64>,
) -> Result<Vec<EntryWithAnalysis>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM entries e
        LEFT JOIN analyses a ON a.entry_id = e.id
        ORDER BY e.created_at DESC, e.id DESC
        {}
        "#,
        JOINED_COLUMNS,
        if limit.is_some() { "LIMIT ?" } else { "" },
    );

    let query = sqlx::query(&sql);
    let query = match limit {
        Some(n) => query.bind(n),
        None => query,
    };

    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(joined_from_row).collect())
}

/// List entries with a given mood, analyses embedded, newest first
pub async fn list_with_analyses_by_mood(
    pool: &SqlitePool,
    mood: &str,
) -> Result<Vec<EntryWithAnalysis>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM entries e
        LEFT JOIN analyses a ON a.entry_id = e.id
        WHERE e.mood = ?
        ORDER BY e.created_at DESC, e.id DESC
        "#,
        JOINED_COLUMNS,
    );

    let rows = sqlx::query(&sql).bind(mood).fetch_all(pool).await?;
    Ok(rows.iter().map(joined_from_row).collect())
}

/// Load one entry with its analysis
pub async fn get_with_analysis(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<EntryWithAnalysis>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM entries e
        LEFT JOIN analyses a ON a.entry_id = e.id
        WHERE e.id = ?
        "#,
        JOINED_COLUMNS,
    );

    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(|row| joined_from_row(&row)))
}

/// Overwrite an entry's user-editable fields (correction path)
pub async fn update_entry_fields(
    pool: &SqlitePool,
    id: i64,
    content: &str,
    mood: Option<&str>,
    tags: &[String],
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE entries
        SET content = ?, mood = ?, tags = ?
        WHERE id = ?
        "#,
    )
    .bind(content)
    .bind(mood)
    .bind(serde_json::to_string(tags)?)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update mood/tags from an analysis outcome (pipeline step, runs inside
/// the analysis transaction)
pub async fn update_mood_tags(
    conn: &mut SqliteConnection,
    id: i64,
    mood: Option<&str>,
    tags: &[String],
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE entries
        SET mood = ?, tags = ?
        WHERE id = ?
        "#,
    )
    .bind(mood)
    .bind(serde_json::to_string(tags)?)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Delete an entry; returns false when no such row existed
///
/// The analysis row cascades away and strategy back-references are nulled
/// by the schema's foreign key actions.
pub async fn delete_entry(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Entry ids that have no analysis row (repair sweep input)
pub async fn ids_missing_analysis(pool: &SqlitePool) -> Result<Vec<i64>> {
    let rows = sqlx::query(
        r#"
        SELECT e.id
        FROM entries e
        LEFT JOIN analyses a ON a.entry_id = e.id
        WHERE a.id IS NULL
        ORDER BY e.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|row| row.get("id")).collect())
}

/// Entry counts grouped by mood, most frequent first
pub async fn mood_counts(pool: &SqlitePool) -> Result<Vec<MoodCount>> {
    let rows = sqlx::query(
        r#"
        SELECT mood, COUNT(*) AS count
        FROM entries
        WHERE mood IS NOT NULL AND mood != ''
        GROUP BY mood
        ORDER BY count DESC, mood
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| MoodCount {
            mood: row.get("mood"),
            count: row.get("count"),
        })
        .collect())
}

const JOINED_COLUMNS: &str = r#"
        e.id, e.content, e.mood, e.tags, e.created_at,
        a.id AS a_id, a.entry_id AS a_entry_id, a.summary AS a_summary,
        a.mood_score AS a_mood_score, a.emotion_tags AS a_emotion_tags,
        a.patterns AS a_patterns, a.connections AS a_connections,
        a.custom_insights AS a_custom_insights, a.ai_reply AS a_ai_reply,
        a.is_ai_generated AS a_is_ai_generated,
        a.created_at AS a_created_at, a.updated_at AS a_updated_at
"#;

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Entry {
    let tags: String = row.get("tags");
    Entry {
        id: row.get("id"),
        content: row.get("content"),
        mood: row.get("mood"),
        tags: decode_string_list(&tags),
        created_at: row.get("created_at"),
    }
}

fn joined_from_row(row: &sqlx::sqlite::SqliteRow) -> EntryWithAnalysis {
    let analysis = row.get::<Option<i64>, _>("a_id").map(|a_id| {
        let emotion_tags: String = row.get("a_emotion_tags");
        let patterns: String = row.get("a_patterns");
        let custom_insights: String = row.get("a_custom_insights");
        Analysis {
            id: a_id,
            entry_id: row.get("a_entry_id"),
            summary: row.get("a_summary"),
            mood_score: row.get("a_mood_score"),
            emotion_tags: decode_string_list(&emotion_tags),
            patterns: decode_string_list(&patterns),
            connections: row.get("a_connections"),
            custom_insights: decode_string_map(&custom_insights),
            ai_reply: row.get("a_ai_reply"),
            is_ai_generated: row.get("a_is_ai_generated"),
            created_at: row.get("a_created_at"),
            updated_at: row.get("a_updated_at"),
        }
    });

    EntryWithAnalysis {
        entry: entry_from_row(row),
        analysis,
    }
}
