//! TaxGuard Common - configuration, errors, and logging shared by the relay.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    ChannelMode, ChannelsConfig, Config, LlmConfig, LlmSecretsConfig, NetworkConfig,
    ObservabilityConfig, ProviderKind, SessionConfig, TwilioConfig, WhatsAppConfig,
};
pub use error::{Error, Result};
