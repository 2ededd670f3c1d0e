//! Domain models shared across the db, service, and API layers
//!
//! Serialized field names follow the client's camelCase contract
//! (`createdAt`, `aiReply`, ...), so these structs double as the JSON
//! response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One user-authored journal submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub content: String,
    pub mood: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Derived emotional/cognitive interpretation of one entry
///
/// At most one per entry (unique on `entry_id`), created or replaced by
/// the analysis pipeline and correctable by the user afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: i64,
    pub entry_id: i64,
    pub summary: String,
    pub mood_score: Option<i64>,
    pub emotion_tags: Vec<String>,
    /// Cognitive distortion labels (catastrophizing, black-and-white, ...)
    pub patterns: Vec<String>,
    pub connections: Option<String>,
    pub custom_insights: BTreeMap<String, String>,
    pub ai_reply: Option<String>,
    pub is_ai_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A suggested coping technique, optionally traced back to the entry that
/// produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Enum-like label: CBT, Mindfulness, Journaling, Action, ...
    pub category: String,
    pub trigger: String,
    pub is_ai_generated: bool,
    pub source_entry_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// User-maintained guidance text for one emotion label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionGuide {
    pub id: i64,
    pub emotion: String,
    pub strategy: String,
    pub updated_at: DateTime<Utc>,
}

/// Singleton-style user settings; the first row is authoritative
///
/// Not serialized directly: the API exposes a view that never includes the
/// stored API key (see `api::settings`).
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub id: i64,
    pub ai_persona: String,
    pub gemini_api_key: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Quote shown on the home feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: i64,
    pub content: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Entry together with its analysis: the committed view the pipeline returns
/// and the list endpoints embed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithAnalysis {
    #[serde(flatten)]
    pub entry: Entry,
    pub analysis: Option<Analysis>,
}

/// Fields accepted when creating an entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Explicit entry date; absent means now
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// User-supplied corrections to an analysis; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCorrection {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub emotion_tags: Option<Vec<String>>,
    #[serde(default)]
    pub connections: Option<String>,
    #[serde(default)]
    pub custom_insights: Option<BTreeMap<String, String>>,
}

/// Coping technique suggested by an analysis outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedStrategy {
    pub title: String,
    pub content: String,
    pub category: String,
    pub trigger: String,
}

/// Unified analysis result shape
///
/// Produced by the response interpreter on success and by the fallback
/// analyzer otherwise; the persistence coordinator handles exactly this one
/// shape regardless of which path produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub summary: String,
    pub mood_score: Option<i64>,
    pub emotion_tags: Vec<String>,
    pub patterns: Vec<String>,
    pub connections: Option<String>,
    pub custom_insights: BTreeMap<String, String>,
    pub ai_reply: Option<String>,
    pub strategies: Vec<SuggestedStrategy>,
    pub ai_generated: bool,
}

impl AnalysisOutcome {
    /// The emotion tag the entry's mood is updated from
    pub fn primary_emotion_tag(&self) -> Option<&str> {
        self.emotion_tags.first().map(String::as_str)
    }
}
