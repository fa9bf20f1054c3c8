//! Google Gemini provider.
//!
//! Gemini gets a flattened transcript: the system instruction followed by
//! `User: …` / `Assistant: …` lines, sent as a single text part.

use super::{Provider, ProviderError};
use crate::message::{Message, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const NAME: &str = "gemini";

/// Gemini provider using an API key.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

// ══════════════════════════════════════════════════════════════════════════════
// API REQUEST/RESPONSE TYPES
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://generativelanguage.googleapis.com")
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "gemini-2.0-flash-exp".into(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }
}

/// Flatten a history into one prompt: system text, blank line, then turns.
pub fn flatten_history(history: &[Message]) -> String {
    let mut prompt = String::new();
    if let Some(system) = history.iter().find(|m| m.role == Role::System) {
        prompt.push_str(&system.content);
    }
    prompt.push_str("\n\n");

    for msg in history {
        match msg.role {
            Role::User => prompt.push_str(&format!("User: {}\n", msg.content)),
            Role::Assistant => prompt.push_str(&format!("Assistant: {}\n", msg.content)),
            Role::System => {}
        }
    }
    prompt
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(&self, history: &[Message]) -> Result<String, ProviderError> {
        let start = Instant::now();

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: flatten_history(history),
                }],
            }],
        };

        let url = format!("{}/v1beta/{}:generateContent", self.base_url, self.model_path());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: NAME,
                message: e.without_url().to_string(),
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

        let result: GenerateContentResponse =
            response.json().await.map_err(|e| ProviderError::MalformedResponse {
                provider: NAME,
                message: e.without_url().to_string(),
            })?;

        // Check for API error in response body
        if let Some(err) = result.error {
            return Err(ProviderError::Api {
                provider: NAME,
                status: status.as_u16(),
                body: err.message,
            });
        }

        let text = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: NAME,
                message: "No response text from Gemini".into(),
            })?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Gemini completion received"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn history() -> Vec<Message> {
        vec![
            Message::system("RULES"),
            Message::user("What is FBR?"),
            Message::assistant("Federal Board of Revenue."),
            Message::user("How do I register?"),
        ]
    }

    #[test]
    fn flatten_renders_transcript() {
        assert_eq!(
            flatten_history(&history()),
            "RULES\n\nUser: What is FBR?\nAssistant: Federal Board of Revenue.\nUser: How do I register?\n"
        );
    }

    #[test]
    fn model_path_prefix() {
        let provider = GeminiProvider::new("key");
        assert_eq!(provider.model_path(), "models/gemini-2.0-flash-exp");
        let provider = provider.with_model("models/gemini-1.5-pro");
        assert_eq!(provider.model_path(), "models/gemini-1.5-pro");
    }

    #[tokio::test]
    async fn generate_sends_single_text_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-exp:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_json(json!({
                "contents": [{ "parts": [{ "text": flatten_history(&history()) }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Visit iris.fbr.gov.pk" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url("g-key", server.uri());
        assert_eq!(provider.generate(&history()).await.unwrap(), "Visit iris.fbr.gov.pk");
    }

    #[tokio::test]
    async fn generate_joins_all_text_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "Step 1: register on IRIS. " },
                    { "text": "Step 2: file your return." }
                ] } }]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url("g-key", server.uri());
        assert_eq!(
            provider.generate(&history()).await.unwrap(),
            "Step 1: register on IRIS. Step 2: file your return."
        );
    }

    #[tokio::test]
    async fn generate_maps_body_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "message": "API key not valid" }
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url("bad", server.uri());
        let err = provider.generate(&history()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref body, .. } if body == "API key not valid"));
    }

    #[tokio::test]
    async fn generate_rejects_missing_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url("g-key", server.uri());
        let err = provider.generate(&history()).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn generate_maps_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::with_base_url("g-key", server.uri());
        let err = provider.generate(&history()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn generate_maps_transport_error_without_key() {
        // Nothing listens on port 1
        let provider = GeminiProvider::with_base_url("secret-g-key", "http://127.0.0.1:1");
        let err = provider.generate(&history()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Request { provider: "gemini", .. }));
        assert!(!err.to_string().contains("secret-g-key"));
    }
}
