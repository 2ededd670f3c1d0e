//! Integration tests for the JSON API
//!
//! Tests cover:
//! - Entry creation with validation, listing with limit, correction, deletion
//! - The degraded path: a failing model still yields a persisted entry with
//!   a fallback analysis and strategy
//! - Delete cascade contract (analysis gone, strategy back-reference nulled)
//! - Emotion stats, per-emotion entries, and guide upsert idempotence
//! - Settings round trip with the write-only API key
//! - Quotes CRUD and random pick
//! - Toolbox listing and user-authored tools
//! - Health endpoint
//! - Malformed query strings rejected with the standard JSON error body

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

use inner_compass::config::PipelineConfig;
use inner_compass::services::{EntryAnalyzer, GenerationClient, MockGenerationClient};
use inner_compass::{build_router, AppState};

/// "焦慮" percent-encoded for request URIs (axum decodes path params)
const ANXIOUS_ENCODED: &str = "%E7%84%A6%E6%85%AE";

/// Test helper: in-memory database with the full schema
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("Should enable foreign keys");
    inner_compass::db::init_tables(&pool)
        .await
        .expect("Should initialize schema");
    pool
}

/// Test helper: app over the given pool and generation client
fn setup_app(pool: SqlitePool, client: Arc<dyn GenerationClient>) -> axum::Router {
    let config = PipelineConfig {
        api_key_fallback: Some("test-key".to_string()),
        ..PipelineConfig::default()
    };
    let analyzer = Arc::new(EntryAnalyzer::new(pool.clone(), client, config));
    let state = AppState::new(pool, analyzer);
    build_router(state)
}

/// Test helper: app whose model calls always fail (fallback path)
async fn setup_fallback_app() -> axum::Router {
    let pool = setup_test_db().await;
    setup_app(pool, Arc::new(MockGenerationClient::failing()))
}

/// Test helper: GET/DELETE request without body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: request carrying a JSON body
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_fallback_app().await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "inner-compass");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
}

// =============================================================================
// Entry Creation Tests
// =============================================================================

#[tokio::test]
async fn test_create_entry_blank_content_rejected_without_row() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/entries", json!({ "content": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());

    let response = app.oneshot(test_request("GET", "/entries")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_entry_survives_model_failure_with_fallback() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/entries",
            json!({ "content": "今天很焦慮", "mood": "焦慮" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["content"], "今天很焦慮");
    assert_eq!(body["mood"], "焦慮");

    let analysis = &body["analysis"];
    assert_eq!(analysis["isAiGenerated"], false);
    assert_eq!(analysis["moodScore"], 4);
    assert!(analysis["summary"].as_str().unwrap().contains("焦慮"));
    assert_eq!(analysis["aiReply"], Value::Null);

    // The fallback strategy landed in the toolbox, linked to this entry
    let response = app.oneshot(test_request("GET", "/tools")).await.unwrap();
    let tools = extract_json(response.into_body()).await;
    let tools = tools.as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["title"], "著地練習 (Grounding)");
    assert_eq!(tools[0]["category"], "CBT");
    assert_eq!(tools[0]["isAiGenerated"], false);
    assert_eq!(tools[0]["sourceEntryId"], body["id"]);
}

#[tokio::test]
async fn test_create_entry_with_working_model_persists_ai_analysis() {
    let pool = setup_test_db().await;
    let raw = r#"{
        "moodScore": 7,
        "summary": "你對新的開始感到期待",
        "emotionTags": ["期待"],
        "patterns": ["過度類化"],
        "aiReply": "為自己感到驕傲吧。",
        "strategy": {
            "title": "睡前寫三件好事",
            "content": "每晚寫下三件順利的小事。",
            "category": "Journaling",
            "trigger": "睡前"
        }
    }"#;
    let app = setup_app(pool, Arc::new(MockGenerationClient::succeeding(raw)));

    let response = app
        .oneshot(json_request(
            "POST",
            "/entries",
            json!({ "content": "明天開始新工作" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    // Mood and tags filled from the analysis when the user gave none
    assert_eq!(body["mood"], "期待");
    assert_eq!(body["tags"], json!(["期待"]));

    let analysis = &body["analysis"];
    assert_eq!(analysis["isAiGenerated"], true);
    assert_eq!(analysis["moodScore"], 7);
    assert_eq!(analysis["aiReply"], "為自己感到驕傲吧。");
    assert_eq!(analysis["patterns"], json!(["過度類化"]));
}

// =============================================================================
// Entry Listing Tests
// =============================================================================

#[tokio::test]
async fn test_list_entries_newest_first_with_limit() {
    let app = setup_fallback_app().await;

    for i in 1..=4 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/entries",
                json!({ "content": format!("第{i}篇"), "date": format!("2025-06-0{i}T12:00:00Z") }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(test_request("GET", "/entries?limit=2"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["content"], "第4篇");
    assert_eq!(entries[1]["content"], "第3篇");
    // Listing embeds each entry's analysis
    assert_eq!(entries[0]["analysis"]["isAiGenerated"], false);

    let response = app.oneshot(test_request("GET", "/entries")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

// =============================================================================
// Entry Correction Tests
// =============================================================================

#[tokio::test]
async fn test_patch_entry_updates_fields_and_corrects_analysis() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/entries",
            json!({ "content": "原本的內容", "mood": "悲傷" }),
        ))
        .await
        .unwrap();
    let created = extract_json(response.into_body()).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/entries/{id}"),
            json!({
                "content": "改寫後的內容",
                "tags": ["反思"],
                "analysis": {
                    "summary": "其實我那天只是累了",
                    "emotionTags": ["疲憊"],
                    "customInsights": { "身體訊號": "睡眠不足" }
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["content"], "改寫後的內容");
    assert_eq!(body["mood"], "悲傷");
    assert_eq!(body["tags"], json!(["反思"]));
    assert_eq!(body["analysis"]["summary"], "其實我那天只是累了");
    assert_eq!(body["analysis"]["emotionTags"], json!(["疲憊"]));
    assert_eq!(body["analysis"]["customInsights"]["身體訊號"], "睡眠不足");
    // Untouched fields survive the correction
    assert_eq!(body["analysis"]["moodScore"], 3);
}

#[tokio::test]
async fn test_patch_missing_entry_is_404() {
    let app = setup_fallback_app().await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/entries/999",
            json!({ "content": "無中生有" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Entry Deletion / Cascade Tests
// =============================================================================

#[tokio::test]
async fn test_delete_entry_cascades_analysis_and_unlinks_strategies() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/entries",
            json!({ "content": "要刪掉的日記", "mood": "生氣" }),
        ))
        .await
        .unwrap();
    let created = extract_json(response.into_body()).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(test_request("DELETE", &format!("/entries/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/entries"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Strategy text survives but no longer points at the entry
    let response = app.clone().oneshot(test_request("GET", "/tools")).await.unwrap();
    let tools = extract_json(response.into_body()).await;
    let tools = tools.as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["sourceEntryId"], Value::Null);

    let response = app
        .oneshot(test_request("DELETE", &format!("/entries/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Re-analysis Tests
// =============================================================================

#[tokio::test]
async fn test_analyze_missing_entry_is_404() {
    let app = setup_fallback_app().await;

    let response = app
        .oneshot(json_request("POST", "/analyze", json!({ "entryId": 42 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("42"));
}

// =============================================================================
// Emotion Library Tests
// =============================================================================

#[tokio::test]
async fn test_emotion_stats_and_filtered_entries() {
    let app = setup_fallback_app().await;

    for (content, mood) in [
        ("會議前很緊張", "焦慮"),
        ("又失眠了", "焦慮"),
        ("散步很舒服", "快樂"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/entries",
                json!({ "content": content, "mood": mood }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(test_request("GET", "/emotions"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let stats = body.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["mood"], "焦慮");
    assert_eq!(stats[0]["count"], 2);
    assert_eq!(stats[1]["mood"], "快樂");

    let response = app
        .oneshot(test_request(
            "GET",
            &format!("/emotions/{ANXIOUS_ENCODED}/entries"),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["mood"], "焦慮");
    assert!(entries[0]["analysis"].is_object());
}

#[tokio::test]
async fn test_emotion_guide_upsert_is_idempotent() {
    let app = setup_fallback_app().await;

    let guide_uri = format!("/emotions/{ANXIOUS_ENCODED}/guide");

    let response = app
        .clone()
        .oneshot(test_request("GET", &guide_uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["strategy"], Value::Null);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &guide_uri,
            json!({ "strategy": "先深呼吸三次" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &guide_uri,
            json!({ "strategy": "改成散步十分鐘" }),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["emotion"], "焦慮");
    assert_eq!(body["strategy"], "改成散步十分鐘");

    let response = app
        .clone()
        .oneshot(test_request("GET", &guide_uri))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["strategy"], "改成散步十分鐘");

    let response = app
        .oneshot(json_request("POST", &guide_uri, json!({ "strategy": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Settings Tests
// =============================================================================

#[tokio::test]
async fn test_settings_round_trip_never_echoes_the_key() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/settings"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["aiPersona"], "");
    assert_eq!(body["hasGeminiApiKey"], false);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/settings",
            json!({ "aiPersona": "像一位溫柔的朋友", "geminiApiKey": "secret-key-123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["aiPersona"], "像一位溫柔的朋友");
    assert_eq!(body["hasGeminiApiKey"], true);
    assert!(body.get("geminiApiKey").is_none());
    assert!(!body.to_string().contains("secret-key-123"));

    let response = app
        .clone()
        .oneshot(test_request("GET", "/settings"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["hasGeminiApiKey"], true);
    assert!(!body.to_string().contains("secret-key-123"));

    // Empty string clears the stored key; persona stays
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/settings",
            json!({ "geminiApiKey": "" }),
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["aiPersona"], "像一位溫柔的朋友");
    assert_eq!(body["hasGeminiApiKey"], false);
}

// =============================================================================
// Quote Tests
// =============================================================================

#[tokio::test]
async fn test_quotes_crud_and_random_pick() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/quotes/random"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/quotes", json!({ "content": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/quotes",
            json!({ "content": "接納自己，是改變的開始。" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quote = extract_json(response.into_body()).await;
    assert_eq!(quote["source"], "未知");
    let quote_id = quote["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/quotes",
            json!({ "content": "一步一步來。", "author": "朋友" }),
        ))
        .await
        .unwrap();
    let second = extract_json(response.into_body()).await;
    assert_eq!(second["source"], "朋友");

    let response = app
        .clone()
        .oneshot(test_request("GET", "/quotes"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/quotes/random"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let picked = extract_json(response.into_body()).await;
    assert!(picked["content"].is_string());

    let response = app
        .clone()
        .oneshot(test_request("DELETE", &format!("/quotes?id={quote_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);

    let response = app
        .oneshot(test_request("DELETE", &format!("/quotes?id={quote_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Toolbox Tests
// =============================================================================

#[tokio::test]
async fn test_user_authored_tool() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tools",
            json!({ "title": "聽一首老歌", "content": "放一首讓你想起好時光的歌。" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tool = extract_json(response.into_body()).await;
    assert_eq!(tool["title"], "聽一首老歌");
    assert_eq!(tool["category"], "自訂");
    assert_eq!(tool["isAiGenerated"], false);
    assert_eq!(tool["sourceEntryId"], Value::Null);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/tools", json!({ "title": " ", "content": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(test_request("GET", "/tools")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

// =============================================================================
// Error Shape Tests
// =============================================================================

#[tokio::test]
async fn test_malformed_query_params_keep_the_json_error_shape() {
    let app = setup_fallback_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/entries?limit=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());

    // A missing required query param takes the same shape
    let response = app.oneshot(test_request("DELETE", "/quotes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}
