//! Entry analysis pipeline
//!
//! `EntryAnalyzer` is the persistence coordinator: it owns the sequence
//! context → prompt → generation → interpretation and guarantees that a
//! created entry always ends up with exactly one analysis row. Failures
//! in the intelligence steps are absorbed into the rule-based fallback;
//! only validation and store failures reach the caller.
//!
//! **Algorithm (entry creation):**
//! 1. Validate content before any side effect
//! 2. Insert the entry row (committed on its own)
//! 3. Assemble context, build the prompt, call the model, interpret
//!    (any failure here substitutes the fallback outcome)
//! 4. In one transaction: fill the entry's mood/tags from the outcome,
//!    upsert the analysis, insert suggested strategies
//! 5. Re-read and return the committed view
//!
//! A crash between steps 2 and 4 leaves an entry without an analysis;
//! [`EntryAnalyzer::ensure_analyses`] repairs that at startup.

use crate::config::PipelineConfig;
use crate::db;
use crate::error::{Error, Result};
use crate::models::{AnalysisOutcome, EntryWithAnalysis, NewEntry};
use crate::services::context::recent_context;
use crate::services::fallback::fallback_analysis;
use crate::services::generation::GenerationClient;
use crate::services::interpreter::interpret;
use crate::services::prompt::build_analysis_prompt;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct EntryAnalyzer {
    db: SqlitePool,
    client: Arc<dyn GenerationClient>,
    config: PipelineConfig,
}

impl EntryAnalyzer {
    pub fn new(db: SqlitePool, client: Arc<dyn GenerationClient>, config: PipelineConfig) -> Self {
        Self { db, client, config }
    }

    /// Create an entry and analyze it
    pub async fn create_entry(&self, new_entry: NewEntry) -> Result<EntryWithAnalysis> {
        let content = new_entry.content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("content is required".to_string()));
        }

        let created_at = new_entry.date.unwrap_or_else(Utc::now);
        let entry_id = db::entries::insert_entry(
            &self.db,
            content,
            new_entry.mood.as_deref(),
            &new_entry.tags,
            created_at,
        )
        .await?;

        let request_id = Uuid::new_v4();
        info!(request_id = %request_id, entry_id, "Entry persisted, starting analysis");

        let outcome = self
            .analyze(request_id, entry_id, content, new_entry.mood.as_deref())
            .await?;
        self.persist_outcome(entry_id, new_entry.mood.as_deref(), &new_entry.tags, &outcome)
            .await?;

        self.committed_view(entry_id).await
    }

    /// Run the pipeline again over an existing entry, replacing its analysis
    pub async fn reanalyze(&self, entry_id: i64) -> Result<EntryWithAnalysis> {
        let entry = db::entries::get_entry(&self.db, entry_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Entry {entry_id} not found")))?;

        let request_id = Uuid::new_v4();
        info!(request_id = %request_id, entry_id, "Re-analyzing entry");

        let outcome = self
            .analyze(request_id, entry_id, &entry.content, entry.mood.as_deref())
            .await?;
        self.persist_outcome(entry_id, entry.mood.as_deref(), &entry.tags, &outcome)
            .await?;

        self.committed_view(entry_id).await
    }

    /// Backfill fallback analyses for entries that have none
    ///
    /// Repairs the crash window between entry insert and analysis upsert.
    /// Runs at startup; returns the number of entries repaired.
    pub async fn ensure_analyses(&self) -> Result<u64> {
        let missing = db::entries::ids_missing_analysis(&self.db).await?;
        if missing.is_empty() {
            return Ok(0);
        }

        warn!(
            count = missing.len(),
            "Entries without analysis found, backfilling"
        );

        let mut repaired = 0u64;
        for entry_id in missing {
            let Some(entry) = db::entries::get_entry(&self.db, entry_id).await? else {
                continue;
            };
            let outcome = fallback_analysis(entry.mood.as_deref());
            self.persist_outcome(entry_id, entry.mood.as_deref(), &entry.tags, &outcome)
                .await?;
            repaired += 1;
        }

        info!(repaired, "Analysis backfill complete");
        Ok(repaired)
    }

    /// Context → prompt → generation → interpretation, falling back on
    /// any intelligence failure
    ///
    /// Only store errors propagate out of here.
    async fn analyze(
        &self,
        request_id: Uuid,
        entry_id: i64,
        content: &str,
        mood: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        let settings = db::settings::get_settings(&self.db).await?;
        let api_key = settings
            .gemini_api_key
            .clone()
            .or_else(|| self.config.api_key_fallback.clone());

        let Some(api_key) = api_key else {
            warn!(request_id = %request_id, "No generation API key configured, using fallback analysis");
            return Ok(fallback_analysis(mood));
        };

        let context_block = recent_context(
            &self.db,
            Some(entry_id),
            self.config.context_window,
            self.config.snippet_chars,
        )
        .await?;
        let prompt = build_analysis_prompt(&settings.ai_persona, &context_block, content, mood);

        let raw = match self.client.generate(&api_key, &prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "Generation failed, using fallback analysis");
                return Ok(fallback_analysis(mood));
            }
        };

        match interpret(&raw) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "Model output rejected, using fallback analysis");
                Ok(fallback_analysis(mood))
            }
        }
    }

    /// Atomically apply one analysis outcome to the store
    ///
    /// User-provided mood/tags win; the outcome fills the blanks.
    async fn persist_outcome(
        &self,
        entry_id: i64,
        current_mood: Option<&str>,
        current_tags: &[String],
        outcome: &AnalysisOutcome,
    ) -> Result<()> {
        let now = Utc::now();
        let mood = current_mood.or_else(|| outcome.primary_emotion_tag());
        let tags = if current_tags.is_empty() {
            &outcome.emotion_tags
        } else {
            current_tags
        };

        let mut tx = self.db.begin().await?;
        db::entries::update_mood_tags(&mut *tx, entry_id, mood, tags).await?;
        db::analyses::upsert_analysis(&mut *tx, entry_id, outcome, now).await?;
        for suggestion in &outcome.strategies {
            db::strategies::insert_strategy(
                &mut *tx,
                suggestion,
                outcome.ai_generated,
                Some(entry_id),
                now,
            )
            .await?;
        }
        tx.commit().await?;

        info!(
            entry_id,
            ai_generated = outcome.ai_generated,
            strategies = outcome.strategies.len(),
            "Analysis persisted"
        );

        Ok(())
    }

    async fn committed_view(&self, entry_id: i64) -> Result<EntryWithAnalysis> {
        db::entries::get_with_analysis(&self.db, entry_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Entry {entry_id} missing after commit")))
    }
}
