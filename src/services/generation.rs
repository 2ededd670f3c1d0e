//! Text-generation client
//!
//! The pipeline talks to the model through the [`GenerationClient`] trait
//! so tests (and the repair sweep) can substitute a deterministic client.
//! [`GeminiClient`] is the production implementation: one POST per model
//! identifier in an ordered fallback list, first usable text wins.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1/models";

/// Model identifiers tried in order until one returns usable text
pub const DEFAULT_MODEL_FALLBACKS: &[&str] =
    &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"];

/// Per-attempt timeout; with three models the worst case stays inside the
/// 60s request ceiling
const ATTEMPT_TIMEOUT_SECS: u64 = 20;

/// Generation client errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error {0}: {1}")]
    Provider(u16, String),

    #[error("Authentication rejected by provider")]
    Auth,

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("All models failed: {0}")]
    AllModelsFailed(String),
}

/// One text-generation request, prompt in, raw model text out
///
/// Implementations take the API key per call so a key updated through the
/// settings page is picked up without rebuilding the client.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text at `candidates[0].content.parts[0].text`, if any
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_deref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()?
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Gemini generateContent client with a model fallback list
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    models: Vec<String>,
}

impl GeminiClient {
    pub fn new() -> Result<Self, GenerationError> {
        Self::with_models(
            DEFAULT_MODEL_FALLBACKS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        )
    }

    pub fn with_models(models: Vec<String>) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ATTEMPT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: GEMINI_BASE_URL.to_string(),
            models,
        })
    }

    /// Point at a different endpoint (tests use a local server)
    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// One attempt against one model identifier
    async fn attempt(
        &self,
        model: &str,
        api_key: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/{}:generateContent?key={}", self.base_url, model, api_key);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GenerationError::Auth);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider(status.as_u16(), error_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(status.as_u16(), e.to_string()))?;

        match parsed.first_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(GenerationError::EmptyResponse),
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let mut failures = Vec::new();

        for model in &self.models {
            debug!(model = %model, "Trying generation model");

            match self.attempt(model, api_key, prompt).await {
                Ok(text) => {
                    debug!(model = %model, chars = text.len(), "Generation succeeded");
                    return Ok(text);
                }
                Err(err) => {
                    warn!(model = %model, error = %err, "Generation model failed");
                    failures.push(format!("{model}: {err}"));
                }
            }
        }

        Err(GenerationError::AllModelsFailed(failures.join("; ")))
    }
}

/// Deterministic client for tests: returns a canned response or a canned
/// failure
pub struct MockGenerationClient {
    response: Result<String, ()>,
}

impl MockGenerationClient {
    /// Always succeeds with the given text
    pub fn succeeding(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
        }
    }

    /// Always fails with `AllModelsFailed`
    pub fn failing() -> Self {
        Self { response: Err(()) }
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, _api_key: &str, _prompt: &str) -> Result<String, GenerationError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(()) => Err(GenerationError::AllModelsFailed(
                "mock: forced failure".to_string(),
            )),
        }
    }
}
