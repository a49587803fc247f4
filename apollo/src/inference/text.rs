//! Text inference adapter for prompt enhancement.
//!
//! One non-streaming completion against the configured enhancement model,
//! instructing it to restructure a rough prompt into a brief numbered list
//! within the configured length bound. Callers clamp the result and fall
//! back to the local template on any failure, so errors here never surface
//! to the end user.

use super::{InferenceError, Result, post_chat};
use crate::config::InferenceConfig;
use crate::prompt::PromptBounds;
use serde::Deserialize;

#[derive(Clone)]
pub struct TextClient {
    http: reqwest::Client,
    config: InferenceConfig,
    bounds: PromptBounds,
}

impl TextClient {
    pub fn new(http: reqwest::Client, config: InferenceConfig, bounds: PromptBounds) -> Self {
        Self { http, config, bounds }
    }

    fn instruction(&self, prompt: &str) -> String {
        let min = self.bounds.min_chars;
        let max = self.bounds.max_chars;
        format!(
            "Enhance the following prompt to make it more structured and specific, \
             but keep it BRIEF and CONCISE (between {min}-{max} characters total):\n\n\
             \"{prompt}\"\n\n\
             Your enhanced version should:\n\
             1. Add 3-4 specific points in a numbered list\n\
             2. Use professional but concise language\n\
             3. Focus only on the most important aspects\n\
             4. Avoid unnecessary details or explanations\n\
             5. Ensure the total character count is between {min}-{max} characters\n\n\
             Return ONLY the enhanced prompt with no explanations or reasoning."
        )
    }

    /// Rewrite the prompt. Returns the raw model text; bounds clamping is the
    /// caller's job.
    pub async fn enhance(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.enhance_model,
            "max_tokens": 1024,
            "messages": [
                {
                    "role": "user",
                    "content": self.instruction(prompt)
                }
            ]
        });

        let response = post_chat(&self.http, &self.config, &body).await?;
        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(InferenceError::EmptyCompletion);
        }

        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TextClient {
        let mut config = InferenceConfig::default();
        config.base_url = server.uri().parse().unwrap();
        TextClient::new(reqwest::Client::new(), config, PromptBounds::default())
    }

    #[tokio::test]
    async fn enhance_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Create a website with:\n1. A\n2. B\n3. C"}}]
            })))
            .mount(&server)
            .await;

        let enhanced = client(&server).enhance("make me a website").await.unwrap();
        assert!(enhanced.starts_with("Create a website"));
    }

    #[tokio::test]
    async fn missing_content_is_empty_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server).enhance("make me a website").await.unwrap_err();
        assert!(matches!(err, InferenceError::EmptyCompletion));
    }
}
