//! SQLite persistence layer
//!
//! Repository modules own all SQL and all (de)serialization of the
//! JSON-blob columns (`tags`, `emotion_tags`, `patterns`,
//! `custom_insights`); nothing outside `db` parses those blobs.

pub mod analyses;
pub mod entries;
pub mod guides;
pub mod quotes;
pub mod settings;
pub mod strategies;

use crate::error::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Decode a JSON string-array blob; malformed blobs read as empty
/// (display data, matches the tolerant read the client always did)
pub(crate) fn decode_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Decode a JSON string-map blob; malformed blobs read as empty
pub(crate) fn decode_string_map(raw: &str) -> BTreeMap<String, String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Open (creating if needed) the database and initialize the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Cascade policy depends on foreign keys being enforced
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a pipeline request writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables if they don't exist (idempotent)
///
/// Also used directly by tests against in-memory pools.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    create_entries_table(pool).await?;
    create_analyses_table(pool).await?;
    create_strategies_table(pool).await?;
    create_emotion_guides_table(pool).await?;
    create_user_settings_table(pool).await?;
    create_quotes_table(pool).await?;

    info!("Database tables initialized");

    Ok(())
}

async fn create_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            mood TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_analyses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL UNIQUE REFERENCES entries(id) ON DELETE CASCADE,
            summary TEXT NOT NULL,
            mood_score INTEGER,
            emotion_tags TEXT NOT NULL DEFAULT '[]',
            patterns TEXT NOT NULL DEFAULT '[]',
            connections TEXT,
            custom_insights TEXT NOT NULL DEFAULT '{}',
            ai_reply TEXT,
            is_ai_generated INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_strategies_table(pool: &SqlitePool) -> Result<()> {
    // "trigger" is an SQLite keyword, quoted throughout
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS strategies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            category TEXT NOT NULL,
            "trigger" TEXT NOT NULL,
            is_ai_generated INTEGER NOT NULL DEFAULT 0,
            source_entry_id INTEGER REFERENCES entries(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_emotion_guides_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS emotion_guides (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            emotion TEXT NOT NULL UNIQUE,
            strategy TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ai_persona TEXT NOT NULL DEFAULT '',
            gemini_api_key TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // First row is authoritative; seed it so reads never miss
    sqlx::query(
        r#"
        INSERT INTO user_settings (id, ai_persona, gemini_api_key, updated_at)
        SELECT 1, '', NULL, datetime('now')
        WHERE NOT EXISTS (SELECT 1 FROM user_settings)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_quotes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quotes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
