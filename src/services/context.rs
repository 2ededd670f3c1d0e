//! Recent-history context assembly
//!
//! Renders the last few entries into a bounded text block the prompt
//! builder embeds, so the model can refer back to earlier days. Output is
//! never empty: an explicit sentinel marks "no prior entries" so the
//! prompt can't confuse a fresh diary with an assembly failure.

use crate::db;
use crate::error::Result;
use sqlx::SqlitePool;

/// Context block used when the diary has no earlier entries
pub const NO_HISTORY_SENTINEL: &str = "（這是第一篇日記，沒有更早的紀錄。）";

/// Render the most recent `window` entries, newest first, excluding the
/// entry currently being analyzed
pub async fn recent_context(
    pool: &SqlitePool,
    exclude_entry_id: Option<i64>,
    window: usize,
    snippet_chars: usize,
) -> Result<String> {
    let entries =
        db::entries::list_recent_excluding(pool, exclude_entry_id, window as i64).await?;

    if entries.is_empty() {
        return Ok(NO_HISTORY_SENTINEL.to_string());
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "- [{}｜{}] {}",
                entry.created_at.format("%Y-%m-%d"),
                entry.mood.as_deref().unwrap_or("-"),
                truncate_chars(&entry.content, snippet_chars),
            )
        })
        .collect();

    Ok(lines.join("\n"))
}

/// Truncate on a char boundary, marking the cut with an ellipsis
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}
