//! TaxGuard AI - Main entry point.

use anyhow::Result;
use taxguard_channels::start_server;
use taxguard_common::config::Config;
use taxguard_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading configuration
    dotenv::dotenv().ok();

    // Load configuration
    let config = Config::load_with_env()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("TaxGuard AI v{}", env!("CARGO_PKG_VERSION"));

    // Start the HTTP server
    start_server(&config).await
}
