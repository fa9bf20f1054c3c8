//! HTTP routes for the relay.
//!
//! `/webhook` is wired according to the channel mode:
//! - Twilio: `POST` form webhook answered inline with TwiML
//! - Cloud: `GET` Meta verification handshake, `POST` event acknowledged
//!   immediately with the reply pushed from a spawned task

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taxguard_common::logging::{generate_trace_id, preview};
use taxguard_common::{ChannelMode, Config};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::Instrument;

use crate::assistant::Assistant;
use crate::provider::{build_provider, Provider};
use crate::replies::SYSTEM_PROMPT;
use crate::responder::Responder;
use crate::session::ConversationStore;
use crate::traits::TextSender;
use crate::twilio::{render_twiml, TwilioWebhookForm, TWIML_CONTENT_TYPE};
use crate::whatsapp::{parse_webhook_event, relay_message, WhatsAppChannel};

/// Maximum accepted webhook body size.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const SERVICE_NAME: &str = "TaxGuard AI WhatsApp Bot";

// ============================================================================
// State
// ============================================================================

/// Shared state for the relay HTTP server.
pub struct AppState {
    /// Which webhook variant is served
    pub mode: ChannelMode,
    /// Reply pipeline
    pub responder: Arc<Responder>,
    /// Cloud API channel (verification token holder)
    pub whatsapp: Arc<WhatsAppChannel>,
    /// Outbound sender for the push variant
    pub outbound: Arc<dyn TextSender>,
    /// Whether the active channel's credentials are present
    pub messaging_configured: bool,
}

impl AppState {
    /// Assemble state from configuration with explicit provider and sender.
    pub fn with_parts(
        config: &Config,
        provider: Option<Arc<dyn Provider>>,
        outbound: Option<Arc<dyn TextSender>>,
    ) -> Self {
        let store = Arc::new(ConversationStore::new(
            SYSTEM_PROMPT.as_str(),
            config.session.window_size,
        ));
        let assistant = Arc::new(Assistant::new(store, provider));
        let responder = Arc::new(Responder::new(assistant, config.llm.expose_error_detail));

        let whatsapp = Arc::new(WhatsAppChannel::from_config(&config.channels.whatsapp));
        let outbound = outbound.unwrap_or_else(|| whatsapp.clone() as Arc<dyn TextSender>);

        Self {
            mode: config.channels.mode,
            responder,
            whatsapp,
            outbound,
            messaging_configured: config.channels.messaging_configured(),
        }
    }

    pub fn ai_provider(&self) -> &'static str {
        self.responder
            .assistant()
            .provider_name()
            .unwrap_or("not_configured")
    }
}

/// Build production state: provider and sender derived from configuration.
pub fn create_state(config: &Config) -> Arc<AppState> {
    Arc::new(AppState::with_parts(config, build_provider(config), None))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub channel_mode: String,
    pub ai_provider: String,
    pub messaging_configured: bool,
}

#[derive(Debug, Serialize)]
struct AckResponse {
    status: &'static str,
}

// ============================================================================
// Health / Status Routes
// ============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        channel_mode: state.mode.to_string(),
        ai_provider: state.ai_provider().into(),
        messaging_configured: state.messaging_configured,
    })
}

async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    let ai_status = match state.responder.assistant().provider_name() {
        Some(name) => format!("🤖 {}", name.to_uppercase()),
        None => "⚠️ Not Configured".to_string(),
    };
    let messaging_status = if state.messaging_configured {
        "✅ Configured"
    } else {
        "⚠️ Not Configured"
    };
    let setup = match state.mode {
        ChannelMode::Twilio => {
            "<li>Your webhook URL: <code>https://YOUR_DOMAIN/webhook</code></li>
            <li>Configure this URL in the Twilio WhatsApp Sandbox</li>
            <li>Set TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN</li>"
        }
        ChannelMode::Cloud => {
            "<li>Set up WhatsApp Cloud API in Meta for Developers</li>
            <li>Set META_ACCESS_TOKEN and META_PHONE_NUMBER_ID</li>
            <li>Configure webhook URL: <code>https://YOUR_DOMAIN/webhook</code> with your META_WEBHOOK_VERIFY_TOKEN</li>"
        }
    };

    Html(format!(
        r#"<html>
<head><title>TaxGuard AI - WhatsApp Bot</title></head>
<body style="font-family: Arial; max-width: 800px; margin: 50px auto; padding: 20px;">
    <h1>🇵🇰 TaxGuard AI - WhatsApp Chatbot</h1>
    <h2>Status: ✅ Running</h2>
    <h3>Channel: {mode}</h3>
    <h3>AI Provider: {ai_status}</h3>
    <h3>Messaging: {messaging_status}</h3>

    <h3>Setup Instructions:</h3>
    <ol>
        {setup}
        <li>Set either OPENAI_API_KEY or GEMINI_API_KEY</li>
        <li>Send "start" to your WhatsApp number to begin</li>
    </ol>

    <h3>Features:</h3>
    <ul>
        <li>✅ Bilingual support (Urdu &amp; English)</li>
        <li>✅ Tax calculations</li>
        <li>✅ Filing guidance</li>
        <li>✅ Deduction recommendations</li>
        <li>✅ FBR query assistance</li>
    </ul>
</body>
</html>"#,
        mode = state.mode,
    ))
}

// ============================================================================
// Twilio Webhook
// ============================================================================

/// POST /webhook (twilio): reply inline as TwiML
async fn twilio_webhook(
    State(state): State<Arc<AppState>>,
    form: Option<Form<TwilioWebhookForm>>,
) -> impl IntoResponse {
    let Form(form) = form.unwrap_or_else(|| {
        tracing::warn!("Twilio webhook body was not a valid form, treating as empty");
        Form(TwilioWebhookForm::default())
    });
    let message = form.into_message();
    let span = tracing::info_span!("twilio_webhook", trace_id = %generate_trace_id());

    let reply = async {
        tracing::info!(
            from = %message.sender,
            text = %preview(message.as_text().unwrap_or_default(), 100),
            "Twilio message received"
        );
        state.responder.respond(&message).await
    }
    .instrument(span)
    .await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
        render_twiml(&reply),
    )
}

// ============================================================================
// WhatsApp Cloud Webhook
// ============================================================================

/// WhatsApp verification query params (Meta webhook verification)
#[derive(Debug, Deserialize)]
struct WhatsAppVerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhook (cloud): Meta webhook verification
async fn whatsapp_verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WhatsAppVerifyQuery>,
) -> impl IntoResponse {
    if state
        .whatsapp
        .verify_subscription(params.mode.as_deref(), params.verify_token.as_deref())
    {
        if let Some(challenge) = params.challenge {
            tracing::info!("WhatsApp webhook verified successfully");
            return (StatusCode::OK, challenge);
        }
        return (StatusCode::BAD_REQUEST, "Missing hub.challenge".to_string());
    }

    tracing::warn!("WhatsApp webhook verification failed: mode or token mismatch");
    (StatusCode::FORBIDDEN, "Forbidden".to_string())
}

/// POST /webhook (cloud): always acknowledged, processing is detached
async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "WhatsApp webhook body could not be read, ignoring");
            return (StatusCode::OK, Json(AckResponse { status: "ok" }));
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(payload) => {
            tracing::debug!(payload = %payload, "WhatsApp webhook payload");
            if let Some(message) = parse_webhook_event(&payload) {
                let span = tracing::info_span!("whatsapp_webhook", trace_id = %generate_trace_id());
                let state = Arc::clone(&state);
                tokio::spawn(
                    async move {
                        relay_message(&state.responder, state.outbound.as_ref(), message).await;
                    }
                    .instrument(span),
                );
            } else {
                tracing::debug!("WhatsApp webhook carried no message, ignoring");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "WhatsApp webhook body is not valid JSON, ignoring");
        }
    }

    (StatusCode::OK, Json(AckResponse { status: "ok" }))
}

// ============================================================================
// Router Builder
// ============================================================================

/// Build the relay HTTP router.
///
/// Twilio bodies over [`MAX_BODY_BYTES`] get 413. Cloud bodies over the cap
/// fail inside the extractor so the event is still acknowledged.
pub fn build_router(state: Arc<AppState>) -> Router {
    let webhook = match state.mode {
        ChannelMode::Twilio => {
            post(twilio_webhook).layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        }
        ChannelMode::Cloud => get(whatsapp_verify)
            .post(whatsapp_webhook)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    };

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/webhook", webhook)
        .with_state(state)
}
