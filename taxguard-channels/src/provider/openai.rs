//! OpenAI chat-completions provider.
//!
//! Sends the full role-tagged history as-is.

use super::{Provider, ProviderError};
use crate::message::Message;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const NAME: &str = "openai";

/// OpenAI API provider.
pub struct OpenAIProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com")
    }

    /// Create with custom base URL (for Azure OpenAI or compatible APIs).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "gpt-4".into(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn request_body<'a>(&'a self, history: &'a [Message]) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model,
            messages: history
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(&self, history: &[Message]) -> Result<String, ProviderError> {
        let start = Instant::now();
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(history))
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: NAME,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: NAME,
                status: status.as_u16(),
                body,
            });
        }

        let openai_response: OpenAIResponse =
            response.json().await.map_err(|e| ProviderError::MalformedResponse {
                provider: NAME,
                message: e.to_string(),
            })?;

        let content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: NAME,
                message: "no completion content in response".into(),
            })?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "OpenAI completion received"
        );

        Ok(content)
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn history() -> Vec<Message> {
        vec![Message::system("Be helpful"), Message::user("Hello")]
    }

    #[test]
    fn test_openai_request_serialization() {
        let provider = OpenAIProvider::new("test-key").with_model("gpt-4o");
        let history = history();
        let json = serde_json::to_value(provider.request_body(&history)).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[tokio::test]
    async fn test_generate_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4", "max_tokens": 500 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4",
                "choices": [
                    { "message": { "role": "assistant", "content": "Assalam o Alaikum!" } },
                    { "message": { "role": "assistant", "content": "second" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAIProvider::with_base_url("sk-test", server.uri());
        let reply = provider.generate(&history()).await.unwrap();
        assert_eq!(reply, "Assalam o Alaikum!");
    }

    #[tokio::test]
    async fn test_generate_maps_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::with_base_url("sk-test", server.uri());
        let err = provider.generate(&history()).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Api {
                provider: "openai",
                status: 429,
                body: "quota exceeded".into()
            }
        );
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::with_base_url("sk-test", server.uri());
        let err = provider.generate(&history()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_generate_maps_transport_errors() {
        // Nothing listens on port 1
        let provider = OpenAIProvider::with_base_url("sk-test", "http://127.0.0.1:1");
        let err = provider.generate(&history()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Request { .. }));
    }
}
