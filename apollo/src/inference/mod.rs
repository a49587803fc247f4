//! Inference adapters for the OpenAI-compatible model gateway.
//!
//! Two thin clients over `reqwest`: [`vision::VisionClient`] turns a
//! wireframe image plus a description into streamed markup, and
//! [`text::TextClient`] rewrites free-text prompts. Both talk to the same
//! `chat/completions` endpoint configured in
//! [`InferenceConfig`](crate::config::InferenceConfig); streamed responses
//! are consumed as Server-Sent Events via [`sse::SseDecoder`].

pub mod sse;
pub mod text;
pub mod vision;

pub use text::TextClient;
pub use vision::{ImageSource, VisionClient, VisionRequest};

use crate::config::InferenceConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    /// The upstream returned a non-success status
    #[error("inference endpoint returned {status}: {body}")]
    Http { status: reqwest::StatusCode, body: String },

    /// Transport-level failure (connect, timeout, body read)
    #[error("failed to reach inference endpoint: {0}")]
    Network(#[from] reqwest::Error),

    /// The model produced no usable text
    #[error("model returned an empty completion")]
    EmptyCompletion,
}

pub type Result<T> = std::result::Result<T, InferenceError>;

/// POST a chat-completions body with the configured auth and attribution
/// headers, surfacing non-2xx responses as [`InferenceError::Http`].
pub(crate) async fn post_chat(
    http: &reqwest::Client,
    config: &InferenceConfig,
    body: &serde_json::Value,
) -> Result<reqwest::Response> {
    let url = format!("{}/chat/completions", config.base_url.as_str().trim_end_matches('/'));

    let mut request = http.post(url).json(body);
    if let Some(api_key) = &config.api_key {
        request = request.bearer_auth(api_key);
    }
    if let Some(referer) = &config.referer {
        request = request.header("HTTP-Referer", referer);
    }
    if let Some(title) = &config.title {
        request = request.header("X-Title", title);
    }

    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(InferenceError::Http { status, body });
    }

    Ok(response)
}
