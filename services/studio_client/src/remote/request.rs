//! services/studio_client/src/remote/request.rs
//!
//! Bearer-token handling for outbound requests, plus the conversion of failed
//! responses into `ClientError::Http`.
//!
//! Nothing here interprets 401/403; some endpoints are deliberately called without
//! a token, so the status is left for the caller to judge.

use crate::error::ClientError;
use crate::remote::protocol::ErrorBody;
use avatar_studio_core::SessionStore;
use reqwest::{RequestBuilder, Response};
use tracing::debug;

/// Attaches `Authorization: Bearer <token>` when a token is stored. Without one the
/// request goes out unauthenticated.
pub async fn with_bearer(builder: RequestBuilder, sessions: &SessionStore) -> RequestBuilder {
    match sessions.token().await {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Like `with_bearer`, but fails with `ClientError::Auth` before anything is sent
/// when no token is stored.
pub async fn require_bearer(
    builder: RequestBuilder,
    sessions: &SessionStore,
) -> Result<RequestBuilder, ClientError> {
    let token = sessions
        .token()
        .await
        .ok_or_else(|| ClientError::Auth("no stored token".to_string()))?;
    Ok(builder.bearer_auth(token))
}

//=========================================================================================
// Failure Extraction
//=========================================================================================

/// Reads a failed response: the body's `detail` string, else `fallback`.
pub async fn failure_from_detail(response: Response, fallback: &str) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = detail_of(&body).unwrap_or_else(|| fallback.to_string());
    debug!("Request failed with HTTP {}: {}", status, message);
    ClientError::Http { status, message }
}

/// Reads a failed response: the `detail` string, else the raw body text, else
/// `fallback`. Used where the backend message must reach the user verbatim.
pub async fn failure_verbatim(response: Response, fallback: &str) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = detail_of(&body)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| fallback.to_string());
    debug!("Request failed with HTTP {}: {}", status, message);
    ClientError::Http { status, message }
}

/// The `detail` string of a JSON error body.
pub fn detail_of(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message())
}
