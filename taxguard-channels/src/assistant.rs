//! LLM boundary: conversation bookkeeping around a single provider call.

use std::sync::Arc;

use crate::message::Role;
use crate::provider::{Provider, ProviderError};
use crate::session::ConversationStore;

/// Why no reply text was generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// No provider key was configured at startup
    #[error("AI provider not configured")]
    NotConfigured,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Owns the conversation store and the provider chosen at startup.
pub struct Assistant {
    store: Arc<ConversationStore>,
    provider: Option<Arc<dyn Provider>>,
}

impl Assistant {
    pub fn new(store: Arc<ConversationStore>, provider: Option<Arc<dyn Provider>>) -> Self {
        Self { store, provider }
    }

    /// Name of the active provider, if any.
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Record the user turn, call the provider once, record the reply.
    ///
    /// Without a provider the store is left untouched. On provider failure
    /// the user turn stays in the history and no assistant turn is added.
    pub async fn generate_reply(&self, sender: &str, text: &str) -> Result<String, GenerateError> {
        let Some(provider) = self.provider.as_ref() else {
            return Err(GenerateError::NotConfigured);
        };

        let context = self.store.append_and_get_context(sender, Role::User, text);
        let reply = provider.generate(&context).await?;
        self.store.append(sender, Role::Assistant, &reply);

        Ok(reply)
    }
}
