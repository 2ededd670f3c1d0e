//! HTTP API handlers
//!
//! One module per resource; each exposes a `*_routes()` builder merged
//! into the application router in `lib.rs`.

pub mod analyze;
pub mod emotions;
pub mod entries;
pub mod health;
pub mod quotes;
pub mod settings;
pub mod tools;

pub use analyze::analyze_routes;
pub use emotions::emotion_routes;
pub use entries::entry_routes;
pub use health::health_routes;
pub use quotes::quote_routes;
pub use settings::settings_routes;
pub use tools::tool_routes;

use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

/// `Query` with the rejection mapped into [`ApiError`]
///
/// Bare `Query` rejects a malformed query string with a plain-text 400;
/// this wrapper keeps those rejections on the `{"error": ...}` body every
/// other error uses.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}
