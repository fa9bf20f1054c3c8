//! Channel traits for outbound delivery.

use async_trait::async_trait;

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel error type.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel credentials not configured")]
    NotConfigured,

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pushes a text reply to a recipient outside the inbound HTTP exchange.
#[async_trait]
pub trait TextSender: Send + Sync {
    /// Get the channel name.
    fn name(&self) -> &'static str;

    /// Send `text` to `recipient`, returning the channel's message ID.
    async fn send_text(&self, recipient: &str, text: &str) -> ChannelResult<String>;
}
