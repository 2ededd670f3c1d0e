//! Quote repository

use crate::error::Result;
use crate::models::Quote;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Insert a quote, returning the stored row
pub async fn insert_quote(pool: &SqlitePool, content: &str, source: &str) -> Result<Quote> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO quotes (content, source, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(content)
    .bind(source)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Quote {
        id: result.last_insert_rowid(),
        content: content.to_string(),
        source: source.to_string(),
        created_at: now,
    })
}

/// List all quotes, newest first
pub async fn list_quotes(pool: &SqlitePool) -> Result<Vec<Quote>> {
    let rows = sqlx::query(
        r#"
        SELECT id, content, source, created_at
        FROM quotes
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(quote_from_row).collect())
}

/// Pick one quote at random; None when the table is empty
pub async fn random_quote(pool: &SqlitePool) -> Result<Option<Quote>> {
    let row = sqlx::query(
        r#"
        SELECT id, content, source, created_at
        FROM quotes
        ORDER BY RANDOM()
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(quote_from_row))
}

/// Delete a quote; returns false when no such row existed
pub async fn delete_quote(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM quotes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn quote_from_row(row: &sqlx::sqlite::SqliteRow) -> Quote {
    Quote {
        id: row.get("id"),
        content: row.get("content"),
        source: row.get("source"),
        created_at: row.get("created_at"),
    }
}
