//! Rule-based fallback analysis
//!
//! The unconditional safety net: pure, infallible, no I/O. When the
//! model call or its output fails, the pipeline substitutes this result,
//! which carries the same shape as an interpreted response so downstream
//! persistence has exactly one case to handle.

use crate::models::{AnalysisOutcome, SuggestedStrategy};
use std::collections::BTreeMap;

/// Map a mood label to the canonical Traditional Chinese bucket
///
/// Accepts both the composer's English labels and the Chinese ones;
/// anything unknown or absent lands in the calm bucket.
pub fn normalize_mood(mood: Option<&str>) -> &'static str {
    let label = mood.map(str::trim).unwrap_or("");
    match label.to_ascii_lowercase().as_str() {
        "happy" => "快樂",
        "sad" => "悲傷",
        "anxious" => "焦慮",
        "angry" => "生氣",
        "neutral" => "平靜",
        _ => match label {
            "快樂" => "快樂",
            "悲傷" => "悲傷",
            "焦慮" => "焦慮",
            "生氣" => "生氣",
            _ => "平靜",
        },
    }
}

/// Deterministic analysis for a mood hint
pub fn fallback_analysis(mood: Option<&str>) -> AnalysisOutcome {
    let mood = normalize_mood(mood);

    let mood_score = match mood {
        "快樂" => 8,
        "悲傷" => 3,
        "焦慮" => 4,
        "生氣" => 2,
        _ => 6,
    };

    let strategy = match mood {
        "生氣" => SuggestedStrategy {
            title: "冷靜倒數".to_string(),
            content: "從 100 倒數到 0，每次減 7。".to_string(),
            category: "CBT".to_string(),
            trigger: "憤怒時".to_string(),
        },
        "悲傷" => SuggestedStrategy {
            title: "自我慈悲書寫".to_string(),
            content: "寫下一句安慰自己的話，像是對待好朋友一樣。".to_string(),
            category: "Journaling".to_string(),
            trigger: "低落時".to_string(),
        },
        "焦慮" => SuggestedStrategy {
            title: "著地練習 (Grounding)".to_string(),
            content: "找出 5 件看得到的、4 件摸得到的、3 件聽得到的東西。".to_string(),
            category: "CBT".to_string(),
            trigger: "恐慌時".to_string(),
        },
        _ => SuggestedStrategy {
            title: "正念呼吸".to_string(),
            content: "深呼吸五次，專注當下。".to_string(),
            category: "Mindfulness".to_string(),
            trigger: "日常".to_string(),
        },
    };

    AnalysisOutcome {
        summary: format!(
            "雖然我無法連線到 AI 大腦，但我能感受到你現在{mood}的情緒。\
             請記住，所有情緒都是暫時的，接納它是變好的第一步。"
        ),
        mood_score: Some(mood_score),
        emotion_tags: vec![mood.to_string()],
        patterns: vec!["暫時性情緒".to_string(), "需要自我關懷".to_string()],
        connections: None,
        custom_insights: BTreeMap::new(),
        ai_reply: None,
        strategies: vec![strategy],
        ai_generated: false,
    }
}
