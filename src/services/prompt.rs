//! Analysis prompt construction
//!
//! Pure string assembly, no I/O. The output-shape example is a
//! load-bearing part of the contract: the response interpreter relies on
//! the model having seen it, so `build_analysis_prompt` always embeds
//! [`OUTPUT_SHAPE_EXAMPLE`] verbatim.

/// Role statement used when the user has not configured a persona
pub const DEFAULT_PERSONA: &str = "你是一位溫暖、專業的 CBT（認知行為治療）心理陪伴者，\
正在閱讀使用者的私人日記。你的任務是理解情緒、指出可能的思考模式，並給出一個具體可行的安心練習。";

/// Literal example of the JSON shape the model must produce
pub const OUTPUT_SHAPE_EXAMPLE: &str = r#"{
  "moodScore": 5,
  "summary": "以第二人稱、繁體中文寫的簡短觀察",
  "emotionTags": ["焦慮", "疲憊"],
  "patterns": ["災難化思考"],
  "connections": "和之前某篇日記的關聯（沒有就填 null）",
  "customInsights": { "身體訊號": "注意肩頸緊繃與呼吸變淺" },
  "aiReply": "對使用者說的一段溫暖回應",
  "strategy": {
    "title": "著地練習",
    "content": "找出 5 件看得到的、4 件摸得到的、3 件聽得到的東西。",
    "category": "CBT",
    "trigger": "恐慌時"
  }
}"#;

/// Compose the full instruction string for one analysis request
///
/// Section order: persona, behavioral rules, delimited history block,
/// delimited current entry (with the user's mood hint when present), then
/// the required output shape.
pub fn build_analysis_prompt(
    persona: &str,
    context_block: &str,
    content: &str,
    mood: Option<&str>,
) -> String {
    let persona = if persona.trim().is_empty() {
        DEFAULT_PERSONA
    } else {
        persona
    };

    let mood_line = match mood {
        Some(m) if !m.trim().is_empty() => format!("\n（使用者為這篇日記標記的心情：{m}）"),
        _ => String::new(),
    };

    format!(
        "{persona}\n\n\
         規則：\n\
         - emotionTags 只能使用情緒形容詞（例如：焦慮、平靜、失落）。\n\
         - 一律使用繁體中文，並以第二人稱「你」回應。\n\
         - 不要解釋你的推理過程，也不要輸出 JSON 以外的任何文字。\n\n\
         === 之前的日記 ===\n\
         {context_block}\n\n\
         === 這次的日記 ===\n\
         {content}{mood_line}\n\n\
         請只輸出符合以下格式的 JSON：\n\
         {OUTPUT_SHAPE_EXAMPLE}"
    )
}
