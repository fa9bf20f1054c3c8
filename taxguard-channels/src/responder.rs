//! Turns inbound text into the final reply text.
//!
//! Rules come first; everything else goes to the assistant. Failures never
//! escape: they become user-visible text here.

use std::sync::Arc;

use taxguard_common::logging::preview;

use crate::assistant::{Assistant, GenerateError};
use crate::message::{InboundContent, InboundMessage};
use crate::replies::{apology, signed, NOT_CONFIGURED_TEXT, UNSUPPORTED_MESSAGE_TEXT};
use crate::rules::route;

/// Reply pipeline shared by both channel variants.
pub struct Responder {
    assistant: Arc<Assistant>,
    expose_error_detail: bool,
}

impl Responder {
    pub fn new(assistant: Arc<Assistant>, expose_error_detail: bool) -> Self {
        Self {
            assistant,
            expose_error_detail,
        }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Reply to an inbound message of any content type.
    pub async fn respond(&self, message: &InboundMessage) -> String {
        match &message.content {
            InboundContent::Text(text) => self.respond_text(&message.sender, text).await,
            InboundContent::Unsupported { kind } => {
                tracing::info!(sender = %message.sender, kind = %kind, "Unsupported message type");
                UNSUPPORTED_MESSAGE_TEXT.to_string()
            }
        }
    }

    /// Reply to a (trimmed) text message.
    pub async fn respond_text(&self, sender: &str, text: &str) -> String {
        let outcome = route(text);
        if let Some(reply) = outcome.fixed_reply() {
            tracing::debug!(sender = %sender, rule = outcome.as_str(), "Rule matched");
            return reply.to_string();
        }

        let body = match self.assistant.generate_reply(sender, text).await {
            Ok(reply) => reply,
            Err(GenerateError::NotConfigured) => {
                tracing::warn!(sender = %sender, "AI provider not configured, sending notice");
                NOT_CONFIGURED_TEXT.to_string()
            }
            Err(GenerateError::Provider(e)) => {
                tracing::warn!(
                    sender = %sender,
                    provider = e.provider(),
                    error = %e,
                    "LLM call failed, sending apology"
                );
                let detail = e.to_string();
                apology(self.expose_error_detail.then_some(detail.as_str()))
            }
        };

        let reply = signed(&body);
        tracing::info!(sender = %sender, reply = %preview(&reply, 100), "Reply generated");
        reply
    }
}
