//! WhatsApp channel using the Business Cloud API.
//!
//! Messages arrive via webhook (push-based); replies are pushed back through
//! the Graph API `messages` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use taxguard_common::logging::preview;
use taxguard_common::WhatsAppConfig;

use crate::message::{InboundContent, InboundMessage};
use crate::responder::Responder;
use crate::traits::{ChannelError, ChannelResult, TextSender};

/// WhatsApp channel using Business Cloud API.
pub struct WhatsAppChannel {
    access_token: Option<String>,
    phone_number_id: Option<String>,
    verify_token: String,
    api_version: String,
    graph_base_url: String,
    client: Client,
}

impl WhatsAppChannel {
    /// Create a channel from configuration. Missing credentials are allowed;
    /// sends then fail with [`ChannelError::NotConfigured`].
    pub fn from_config(config: &WhatsAppConfig) -> Self {
        Self {
            access_token: config.access_token.clone().filter(|t| !t.trim().is_empty()),
            phone_number_id: config.phone_number_id.clone().filter(|t| !t.trim().is_empty()),
            verify_token: config.verify_token.clone(),
            api_version: config.api_version.clone(),
            graph_base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Get the verify token for webhook verification.
    pub fn verify_token(&self) -> &str {
        &self.verify_token
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }

    /// Check a Meta webhook verification request.
    pub fn verify_subscription(&self, mode: Option<&str>, token: Option<&str>) -> bool {
        // Constant-time comparison to prevent timing attacks
        let token_matches = token.is_some_and(|t| {
            let expected = self.verify_token.as_bytes();
            t.len() == expected.len()
                && t.as_bytes()
                    .iter()
                    .zip(expected)
                    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                    == 0
        });

        mode == Some("subscribe") && token_matches
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.graph_base_url, self.api_version, phone_number_id
        )
    }
}

/// Extract the first message of a Cloud API webhook payload.
///
/// Returns `None` for anything that is not a `messages` change on a
/// `whatsapp_business_account` object, or when any level is missing.
pub fn parse_webhook_event(payload: &Value) -> Option<InboundMessage> {
    if payload.get("object").and_then(Value::as_str) != Some("whatsapp_business_account") {
        return None;
    }

    let change = payload.get("entry")?.get(0)?.get("changes")?.get(0)?;
    if change.get("field").and_then(Value::as_str) != Some("messages") {
        return None;
    }

    let message = change.get("value")?.get("messages")?.get(0)?;
    let sender = message.get("from")?.as_str()?.to_string();

    let kind = message.get("type").and_then(Value::as_str).unwrap_or("unknown");
    if kind != "text" {
        return Some(InboundMessage {
            sender,
            content: InboundContent::Unsupported { kind: kind.to_string() },
        });
    }

    let body = message.get("text")?.get("body")?.as_str()?;
    Some(InboundMessage::text(sender, body))
}

/// Produce a reply for one inbound message and push it to the sender.
///
/// Send failures are logged and swallowed.
pub async fn relay_message(responder: &Responder, sender: &dyn TextSender, message: InboundMessage) {
    if let Some(text) = message.as_text() {
        tracing::info!(from = %message.sender, text = %preview(text, 100), "WhatsApp message received");
    }

    let reply = responder.respond(&message).await;

    match sender.send_text(&message.sender, &reply).await {
        Ok(message_id) => {
            tracing::info!(
                to = %message.sender,
                channel = sender.name(),
                message_id = %message_id,
                reply = %preview(&reply, 100),
                "Reply sent"
            );
        }
        Err(e) => {
            tracing::error!(to = %message.sender, channel = sender.name(), error = %e, "Failed to send reply");
        }
    }
}

#[async_trait]
impl TextSender for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn send_text(&self, recipient: &str, text: &str) -> ChannelResult<String> {
        let (Some(access_token), Some(phone_number_id)) =
            (self.access_token.as_deref(), self.phone_number_id.as_deref())
        else {
            return Err(ChannelError::NotConfigured);
        };

        // Normalize recipient (remove leading + for API)
        let to = recipient.strip_prefix('+').unwrap_or(recipient);

        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": text
            }
        });

        let resp = self
            .client
            .post(self.messages_url(phone_number_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(format!("WhatsApp send error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(format!(
                "WhatsApp API error ({status}): {error}"
            )));
        }

        let result: Value = resp
            .json()
            .await
            .map_err(|e| ChannelError::Internal(format!("Failed to parse response: {e}")))?;

        let message_id = result
            .get("messages")
            .and_then(|m| m.get(0))
            .and_then(|msg| msg.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Ok(message_id)
    }
}
