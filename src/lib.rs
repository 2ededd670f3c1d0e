//! Inner Compass library
//!
//! Personal journaling service: diary entries are analyzed by an external
//! Gemini-compatible model for mood, emotion tags, and cognitive patterns,
//! with an empathetic reply and a coping strategy; everything persists in
//! SQLite behind a JSON API. When the model is unreachable, a rule-based
//! fallback keeps every entry analyzed.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, Error, Result};

use axum::Router;
use chrono::{DateTime, Utc};
use services::EntryAnalyzer;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Entry analysis pipeline
    pub analyzer: Arc<EntryAnalyzer>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, analyzer: Arc<EntryAnalyzer>) -> Self {
        Self {
            db,
            analyzer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::entry_routes())
        .merge(api::analyze_routes())
        .merge(api::emotion_routes())
        .merge(api::settings_routes())
        .merge(api::quote_routes())
        .merge(api::tool_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
