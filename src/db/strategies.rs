//! Strategy repository (the toolbox)
//!
//! Rows come from two places: the analysis pipeline (AI- or
//! fallback-suggested, linked to their source entry) and the user's own
//! additions through the toolbox page.

use crate::error::Result;
use crate::models::{Strategy, SuggestedStrategy};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Insert one strategy row, returning its id
pub async fn insert_strategy(
    conn: &mut SqliteConnection,
    suggestion: &SuggestedStrategy,
    is_ai_generated: bool,
    source_entry_id: Option<i64>,
    created_at: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO strategies (title, content, category, "trigger",
                                is_ai_generated, source_entry_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&suggestion.title)
    .bind(&suggestion.content)
    .bind(&suggestion.category)
    .bind(&suggestion.trigger)
    .bind(is_ai_generated)
    .bind(source_entry_id)
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// List all strategies, newest first
pub async fn list_strategies(pool: &SqlitePool) -> Result<Vec<Strategy>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, category, "trigger",
               is_ai_generated, source_entry_id, created_at
        FROM strategies
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Strategy {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            category: row.get("category"),
            trigger: row.get("trigger"),
            is_ai_generated: row.get("is_ai_generated"),
            source_entry_id: row.get("source_entry_id"),
            created_at: row.get("created_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entries;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn sample() -> SuggestedStrategy {
        SuggestedStrategy {
            title: "正念呼吸".to_string(),
            content: "深呼吸五次，專注當下。".to_string(),
            category: "Mindfulness".to_string(),
            trigger: "日常".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_list() {
        let pool = setup_pool().await;

        let mut conn = pool.acquire().await.unwrap();
        insert_strategy(&mut conn, &sample(), false, None, Utc::now())
            .await
            .unwrap();
        drop(conn);

        let listed = list_strategies(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "正念呼吸");
        assert_eq!(listed[0].trigger, "日常");
        assert!(!listed[0].is_ai_generated);
        assert!(listed[0].source_entry_id.is_none());
    }

    #[tokio::test]
    async fn deleting_source_entry_nulls_the_back_reference() {
        let pool = setup_pool().await;
        let entry_id = entries::insert_entry(&pool, "內容", None, &[], Utc::now())
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        insert_strategy(&mut conn, &sample(), true, Some(entry_id), Utc::now())
            .await
            .unwrap();
        drop(conn);

        assert!(entries::delete_entry(&pool, entry_id).await.unwrap());

        let listed = list_strategies(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].source_entry_id.is_none());
    }
}
