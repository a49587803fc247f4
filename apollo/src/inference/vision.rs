//! Vision inference adapter.
//!
//! Sends a wireframe image plus a free-text description to a multimodal
//! model and yields the generated markup. The upstream streams its
//! completion; [`VisionClient::stream`] exposes the content deltas as they
//! arrive (for the streaming HTTP route) and [`VisionClient::generate`]
//! concatenates them into one completion (for the orchestrator).

use super::{InferenceError, Result, post_chat, sse::SseDecoder};
use crate::config::InferenceConfig;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// System prompt steering the model toward returning page markup.
const SYSTEM_PROMPT: &str =
    "You are a professional UI/UX developer. Analyze the image and provide detailed, accurate HTML/CSS code.";

/// The image input: a freshly uploaded blob (inlined as a data URL) or an
/// already-stored image addressed by its public URL (re-invocation and
/// regeneration).
#[derive(Debug, Clone)]
pub enum ImageSource {
    DataUrl(String),
    Url(String),
}

impl ImageSource {
    pub fn from_bytes(content_type: &str, bytes: &[u8]) -> Self {
        Self::DataUrl(format!("data:{content_type};base64,{}", BASE64.encode(bytes)))
    }

    fn as_url(&self) -> &str {
        match self {
            Self::DataUrl(url) | Self::Url(url) => url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub description: String,
    pub image: ImageSource,
}

#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    config: InferenceConfig,
}

impl VisionClient {
    pub fn new(http: reqwest::Client, config: InferenceConfig) -> Self {
        Self { http, config }
    }

    fn request_body(&self, request: &VisionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "stream": true,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": request.description
                        },
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": request.image.as_url(),
                                "detail": "auto"
                            }
                        }
                    ]
                }
            ]
        })
    }

    /// Stream the completion's content deltas as they arrive.
    ///
    /// The upstream request is sent (and its status checked) before this
    /// returns, so callers can still surface a clean error response; the
    /// body is then pumped in a background task.
    pub async fn stream(&self, request: &VisionRequest) -> Result<ReceiverStream<Result<String>>> {
        let response = post_chat(&self.http, &self.config, &self.request_body(request)).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(pump_deltas(response, tx));

        Ok(ReceiverStream::new(rx))
    }

    /// Run inference to completion and return the concatenated text.
    ///
    /// An empty or whitespace-only completion is an error: downstream
    /// persistence must never record a "successful" generation with no code.
    pub async fn generate(&self, request: &VisionRequest) -> Result<String> {
        let mut stream = self.stream(request).await?;

        let mut completion = String::new();
        while let Some(delta) = stream.next().await {
            completion.push_str(&delta?);
        }

        if completion.trim().is_empty() {
            return Err(InferenceError::EmptyCompletion);
        }

        Ok(completion)
    }
}

/// Streamed chat-completion chunk, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

fn delta_from_payload(payload: &str) -> Option<String> {
    let chunk: StreamChunk = serde_json::from_str(payload).ok()?;
    chunk.choices.into_iter().next()?.delta.content.filter(|c| !c.is_empty())
}

/// Read the SSE body and forward content deltas into the channel.
///
/// A transport error mid-stream is forwarded as the final item; a dropped
/// receiver (client went away) just stops the pump.
async fn pump_deltas(response: reqwest::Response, tx: mpsc::Sender<Result<String>>) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx.send(Err(InferenceError::Network(e))).await;
                return;
            }
        };

        for payload in decoder.push(&chunk) {
            if payload == "[DONE]" {
                return;
            }
            if let Some(delta) = delta_from_payload(&payload) {
                if tx.send(Ok(delta)).await.is_err() {
                    return;
                }
            }
        }
    }

    for payload in decoder.finish() {
        if payload == "[DONE]" {
            return;
        }
        if let Some(delta) = delta_from_payload(&payload) {
            if tx.send(Ok(delta)).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceConfig;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VisionClient {
        let mut config = InferenceConfig::default();
        config.base_url = server.uri().parse().unwrap();
        config.api_key = Some("test-key".to_string());
        VisionClient::new(reqwest::Client::new(), config)
    }

    fn request() -> VisionRequest {
        VisionRequest {
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            description: "a login page with email and password fields".to_string(),
            image: ImageSource::from_bytes("image/png", b"fake png bytes"),
        }
    }

    fn sse_body(deltas: &[&str]) -> String {
        let mut body = String::new();
        for delta in deltas {
            let chunk = serde_json::json!({"choices": [{"delta": {"content": delta}}]});
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn generate_concatenates_streamed_deltas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&["<html>", "<body>", "</body></html>"])),
            )
            .mount(&server)
            .await;

        let code = client(&server).generate(&request()).await.unwrap();
        assert_eq!(code, "<html><body></body></html>");
    }

    #[tokio::test]
    async fn empty_completion_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&[])),
            )
            .mount(&server)
            .await;

        let err = client(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, InferenceError::EmptyCompletion));
    }

    #[tokio::test]
    async fn upstream_error_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("provider exploded"))
            .mount(&server)
            .await;

        let err = client(&server).generate(&request()).await.unwrap_err();
        match err {
            InferenceError::Http { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "provider exploded");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn data_url_encodes_content_type() {
        let ImageSource::DataUrl(url) = ImageSource::from_bytes("image/png", b"abc") else {
            panic!("expected data url");
        };
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
