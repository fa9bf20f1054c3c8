//! Configuration management for the TaxGuard relay.
//!
//! The relay reads an optional JSON file at `~/.taxguard/config.json`
//! (or the path in `TAXGUARD_CONFIG`) and then applies environment overrides.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! ## Server
//! - `PORT` → network.port
//! - `TAXGUARD_BIND_ADDRESS` → network.bind
//! - `TAXGUARD_CHANNEL` → channels.mode (`twilio` | `cloud`)
//!
//! ## LLM API Keys (→ secrets.*)
//! - `OPENAI_API_KEY` → secrets.openai
//! - `GEMINI_API_KEY` / `GOOGLE_API_KEY` → secrets.gemini
//! - `OPENAI_MODEL`, `GEMINI_MODEL` → llm.openai_model, llm.gemini_model
//!
//! ## Messaging
//! - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` → channels.twilio.*
//! - `META_ACCESS_TOKEN` → channels.whatsapp.access_token
//! - `META_PHONE_NUMBER_ID` → channels.whatsapp.phone_number_id
//! - `META_WEBHOOK_VERIFY_TOKEN` → channels.whatsapp.verify_token
//! - `META_API_VERSION` → channels.whatsapp.api_version
//!
//! ## Logging
//! - `TAXGUARD_LOG_LEVEL`, `TAXGUARD_LOG_FORMAT` → observability.*

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

/// Verify token used when none is configured. Startup warns about it.
pub const DEFAULT_VERIFY_TOKEN: &str = "taxguard_secret_token_123";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".taxguard"),
        |dirs| dirs.home_dir().join(".taxguard"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var("TAXGUARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| config_dir().join("config.json"))
}

// ============================================================================
// Network
// ============================================================================

/// Listening address for the webhook server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

// ============================================================================
// Channels
// ============================================================================

/// Which messaging platform originates the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Twilio WhatsApp sandbox: reply is returned as TwiML in the same response.
    #[default]
    Twilio,
    /// Meta WhatsApp Cloud API: ack immediately, push the reply separately.
    Cloud,
}

impl ChannelMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twilio => "twilio",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twilio" => Ok(Self::Twilio),
            "cloud" | "meta" | "whatsapp_cloud" => Ok(Self::Cloud),
            other => Err(Error::Config(format!("unknown channel mode '{other}'"))),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub mode: ChannelMode,
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

impl ChannelsConfig {
    /// Whether the credentials for the active channel mode are present.
    pub fn messaging_configured(&self) -> bool {
        match self.mode {
            ChannelMode::Twilio => self.twilio.is_configured(),
            ChannelMode::Cloud => self.whatsapp.is_configured(),
        }
    }
}

/// Twilio WhatsApp sandbox credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(&self.account_sid).is_some() && non_empty(&self.auth_token).is_some()
    }
}

/// WhatsApp channel configuration (via WhatsApp Business Cloud API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// WhatsApp Business API access token
    #[serde(default)]
    pub access_token: Option<String>,
    /// WhatsApp Business API phone number ID
    #[serde(default)]
    pub phone_number_id: Option<String>,
    /// Webhook verify token
    #[serde(default = "default_verify_token")]
    pub verify_token: String,
    /// Graph API version segment, e.g. `v21.0`
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Graph API base URL
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: default_verify_token(),
            api_version: default_api_version(),
            graph_base_url: default_graph_base_url(),
        }
    }
}

impl WhatsAppConfig {
    pub fn is_configured(&self) -> bool {
        non_empty(&self.access_token).is_some() && non_empty(&self.phone_number_id).is_some()
    }

    pub fn uses_default_verify_token(&self) -> bool {
        self.verify_token == DEFAULT_VERIFY_TOKEN
    }
}

fn default_verify_token() -> String {
    DEFAULT_VERIFY_TOKEN.into()
}

fn default_api_version() -> String {
    "v21.0".into()
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".into()
}

// ============================================================================
// LLM
// ============================================================================

/// LLM provider API keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSecretsConfig {
    #[serde(default)]
    pub openai: Option<String>,
    #[serde(default, alias = "google")]
    pub gemini: Option<String>,
}

/// Concrete LLM provider selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model and request settings for the LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Append the provider error to the apology sent to users.
    #[serde(default = "default_true")]
    pub expose_error_detail: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            gemini_model: default_gemini_model(),
            gemini_base_url: default_gemini_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            expose_error_detail: true,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4".into()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".into()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash-exp".into()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

// ============================================================================
// Session / Observability
// ============================================================================

/// Conversation window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of recent turns kept after the system instruction.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

fn default_window_size() -> usize {
    10
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub secrets: LlmSecretsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load configuration with environment variable overrides, then validate.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply process environment overrides.
    pub fn apply_env_overrides(&mut self) -> crate::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.network.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORT '{port}'")))?;
        }
        if let Some(bind) = lookup("TAXGUARD_BIND_ADDRESS") {
            self.network.bind = bind;
        }
        if let Some(mode) = lookup("TAXGUARD_CHANNEL") {
            self.channels.mode = mode.parse()?;
        }

        if let Some(level) = lookup("TAXGUARD_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("TAXGUARD_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.secrets.openai = Some(key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.secrets.gemini = Some(key);
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.openai_model = model;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.llm.gemini_model = model;
        }

        let twilio = &mut self.channels.twilio;
        if let Some(sid) = lookup("TWILIO_ACCOUNT_SID") {
            twilio.account_sid = Some(sid);
        }
        if let Some(token) = lookup("TWILIO_AUTH_TOKEN") {
            twilio.auth_token = Some(token);
        }

        let whatsapp = &mut self.channels.whatsapp;
        if let Some(token) = lookup("META_ACCESS_TOKEN") {
            whatsapp.access_token = Some(token);
        }
        if let Some(id) = lookup("META_PHONE_NUMBER_ID") {
            whatsapp.phone_number_id = Some(id);
        }
        if let Some(token) = lookup("META_WEBHOOK_VERIFY_TOKEN") {
            whatsapp.verify_token = token;
        }
        if let Some(version) = lookup("META_API_VERSION") {
            whatsapp.api_version = version;
        }

        Ok(())
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.network.port == 0 {
            return Err(Error::Config("network.port must be non-zero".into()));
        }
        if self.session.window_size == 0 {
            return Err(Error::Config("session.window_size must be at least 1".into()));
        }
        if self.channels.whatsapp.verify_token.is_empty() {
            return Err(Error::Config("channels.whatsapp.verify_token must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve the LLM provider: the first configured key wins, OpenAI first.
    pub fn ai_provider(&self) -> Option<ProviderKind> {
        if non_empty(&self.secrets.openai).is_some() {
            Some(ProviderKind::OpenAi)
        } else if non_empty(&self.secrets.gemini).is_some() {
            Some(ProviderKind::Gemini)
        } else {
            None
        }
    }

    /// API key for the given provider, ignoring empty strings.
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenAi => non_empty(&self.secrets.openai),
            ProviderKind::Gemini => non_empty(&self.secrets.gemini),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
