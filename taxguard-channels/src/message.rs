//! Message types for conversations and inbound webhooks.

use serde::{Deserialize, Serialize};

/// Originator of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Get the role as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Inbound message content extracted from a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundContent {
    /// Plain text, already trimmed
    Text(String),
    /// Any non-text WhatsApp message type (image, audio, sticker, ...)
    Unsupported { kind: String },
}

/// A message received from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender identifier (phone number as delivered by the channel)
    pub sender: String,
    pub content: InboundContent,
}

impl InboundMessage {
    pub fn text(sender: impl Into<String>, text: &str) -> Self {
        Self {
            sender: sender.into(),
            content: InboundContent::Text(text.trim().to_string()),
        }
    }

    /// Get text content if available.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            InboundContent::Text(text) => Some(text),
            InboundContent::Unsupported { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn test_inbound_text_is_trimmed() {
        let msg = InboundMessage::text("whatsapp:+923001234567", "  hello there \n");
        assert_eq!(msg.as_text(), Some("hello there"));
    }

    #[test]
    fn test_unsupported_has_no_text() {
        let msg = InboundMessage {
            sender: "923001234567".into(),
            content: InboundContent::Unsupported { kind: "image".into() },
        };
        assert!(msg.as_text().is_none());
    }
}
