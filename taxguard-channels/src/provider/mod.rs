//! LLM provider abstraction.
//!
//! Exactly one provider is built at startup from configuration. Callers only
//! see the [`Provider`] trait.

mod gemini;
mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use async_trait::async_trait;
use std::sync::Arc;
use taxguard_common::{Config, ProviderKind};

use crate::message::Message;

/// Capability interface for generating a reply from a conversation.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Generate the next assistant turn. `history` starts with the system entry.
    async fn generate(&self, history: &[Message]) -> Result<String, ProviderError>;
}

/// Provider call failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Network or transport failure before a response arrived
    #[error("[{provider}] request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    /// Non-success HTTP status or an error object in the body
    #[error("[{provider}] API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Response did not have the expected shape
    #[error("[{provider}] malformed response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::Request { provider, .. }
            | Self::Api { provider, .. }
            | Self::MalformedResponse { provider, .. } => provider,
        }
    }
}

/// Build the configured provider, if any key is set.
pub fn build_provider(config: &Config) -> Option<Arc<dyn Provider>> {
    let kind = config.ai_provider()?;
    let key = config.api_key(kind)?;
    let llm = &config.llm;

    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::OpenAi => Arc::new(
            OpenAIProvider::with_base_url(key, &llm.openai_base_url)
                .with_model(&llm.openai_model)
                .with_sampling(llm.temperature, llm.max_tokens),
        ),
        ProviderKind::Gemini => Arc::new(
            GeminiProvider::with_base_url(key, &llm.gemini_base_url).with_model(&llm.gemini_model),
        ),
    };

    Some(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keys_no_provider() {
        assert!(build_provider(&Config::default()).is_none());
    }

    #[test]
    fn openai_key_builds_openai() {
        let mut config = Config::default();
        config.secrets.openai = Some("sk-test".into());
        config.secrets.gemini = Some("g-test".into());
        assert_eq!(build_provider(&config).unwrap().name(), "openai");
    }

    #[test]
    fn gemini_key_builds_gemini() {
        let mut config = Config::default();
        config.secrets.gemini = Some("g-test".into());
        assert_eq!(build_provider(&config).unwrap().name(), "gemini");
    }

    #[test]
    fn error_display_includes_provider() {
        let err = ProviderError::Api {
            provider: "openai",
            status: 429,
            body: "quota exceeded".into(),
        };
        assert_eq!(err.provider(), "openai");
        assert_eq!(err.to_string(), "[openai] API error (429): quota exceeded");
    }
}
