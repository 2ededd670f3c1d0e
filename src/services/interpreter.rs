//! Model-output interpretation
//!
//! Models are told to output bare JSON; in practice they wrap it in code
//! fences or surround it with prose. The interpreter strips fences,
//! scans for the first balanced object span, then parses and validates
//! it. All-or-nothing: a payload that can't be fully trusted is rejected
//! whole, and the caller falls back to the rule-based analyzer.

use crate::models::{AnalysisOutcome, SuggestedStrategy};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Interpretation failures; the coordinator treats these exactly like
/// generation failures
#[derive(Debug, Error)]
pub enum InterpretationError {
    #[error("No JSON object found in model output")]
    NoJsonObject,

    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Parse target for the prompted schema; optional fields default so only
/// genuinely required ones can fail validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    summary: Option<String>,
    #[serde(default)]
    mood_score: Option<i64>,
    emotion_tags: Option<Vec<String>>,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    connections: Option<String>,
    #[serde(default)]
    custom_insights: BTreeMap<String, String>,
    ai_reply: Option<String>,
    #[serde(default)]
    strategy: Option<RawStrategy>,
    #[serde(default)]
    tool_suggestions: Vec<RawStrategy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStrategy {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    trigger: String,
}

impl RawStrategy {
    fn into_suggestion(self) -> Option<SuggestedStrategy> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return None;
        }
        Some(SuggestedStrategy {
            title: self.title,
            content: self.content,
            category: self.category,
            trigger: self.trigger,
        })
    }
}

/// Interpret raw model text into a validated analysis outcome
pub fn interpret(raw: &str) -> Result<AnalysisOutcome, InterpretationError> {
    let cleaned = strip_code_fences(raw);
    let span = first_balanced_object(&cleaned).ok_or(InterpretationError::NoJsonObject)?;
    let parsed: RawAnalysis = serde_json::from_str(span)?;

    let summary = parsed
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or(InterpretationError::MissingField("summary"))?;
    let emotion_tags = parsed
        .emotion_tags
        .ok_or(InterpretationError::MissingField("emotionTags"))?;
    let ai_reply = parsed
        .ai_reply
        .filter(|s| !s.trim().is_empty())
        .ok_or(InterpretationError::MissingField("aiReply"))?;

    // A score the model couldn't keep in range is not worth keeping at all
    let mood_score = parsed.mood_score.filter(|score| (1..=10).contains(score));

    let mut strategies: Vec<SuggestedStrategy> = Vec::new();
    strategies.extend(parsed.strategy.and_then(RawStrategy::into_suggestion));
    strategies.extend(
        parsed
            .tool_suggestions
            .into_iter()
            .filter_map(RawStrategy::into_suggestion),
    );

    Ok(AnalysisOutcome {
        summary,
        mood_score,
        emotion_tags,
        patterns: parsed.patterns,
        connections: parsed.connections.filter(|c| !c.trim().is_empty()),
        custom_insights: parsed.custom_insights,
        ai_reply: Some(ai_reply),
        strategies,
        ai_generated: true,
    })
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

/// First balanced `{...}` span, ignoring braces inside string literals
///
/// Braces and quotes are ASCII, so scanning bytes is safe even with
/// multi-byte content in between.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if *b == b'\\' {
                escaped = true;
            } else if *b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
