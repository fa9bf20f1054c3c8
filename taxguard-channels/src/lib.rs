//! TaxGuard Channels - WhatsApp webhook relay for Pakistani tax guidance.
//!
//! Inbound WhatsApp messages arrive through one of two transports:
//! - Twilio webhook, answered inline with TwiML
//! - Meta WhatsApp Cloud API webhook, acknowledged and answered by push
//!
//! ## Architecture
//!
//! ```text
//! User → webhook → rules ──────────────→ fixed reply
//!                    ↓
//!             ConversationStore → Provider (OpenAI | Gemini)
//!                    ↓
//! User ←── TwiML / Graph API ←── signed reply
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod assistant;
pub mod message;
pub mod provider;
pub mod replies;
pub mod responder;
pub mod routes;
pub mod rules;
pub mod session;
pub mod tax;
pub mod traits;
pub mod twilio;
pub mod whatsapp;

// Re-export commonly used types
pub use assistant::{Assistant, GenerateError};
pub use message::{InboundContent, InboundMessage, Message, Role};
pub use provider::{build_provider, GeminiProvider, OpenAIProvider, Provider, ProviderError};
pub use responder::Responder;
pub use routes::{build_router, create_state, AppState, HealthResponse};
pub use rules::{route, RuleOutcome};
pub use session::ConversationStore;
pub use tax::{compute_tax, TaxBracket, TAX_BRACKETS};
pub use traits::{ChannelError, ChannelResult, TextSender};
pub use whatsapp::WhatsAppChannel;

use anyhow::Context;
use std::net::SocketAddr;
use taxguard_common::{ChannelMode, Config};

/// Start the relay HTTP server and serve until the listener fails.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let ip = config
        .network
        .bind
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid bind address: {}", config.network.bind))?;
    let addr = SocketAddr::from((ip, config.network.port));

    let state = create_state(config);

    match state.responder.assistant().provider_name() {
        Some(name) => tracing::info!(provider = name, "AI provider configured"),
        None => tracing::warn!("No AI provider key set, LLM replies are disabled"),
    }
    if !state.messaging_configured {
        tracing::warn!(channel = %config.channels.mode, "Messaging credentials are not configured");
    }
    if config.channels.mode == ChannelMode::Cloud
        && config.channels.whatsapp.uses_default_verify_token()
    {
        tracing::warn!("Using the default webhook verify token, set META_WEBHOOK_VERIFY_TOKEN");
    }

    let router = build_router(state);

    tracing::info!(channel = %config.channels.mode, "Starting TaxGuard AI on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve(listener, router, shutdown_signal()).await
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    router: axum::Router,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("TaxGuard AI stopped");
    Ok(())
}

/// Resolve on Ctrl+C, or on SIGTERM under unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
