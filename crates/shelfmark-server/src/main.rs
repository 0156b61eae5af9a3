//! Shelfmark server - standalone entry point for the suggestion API
//!
//! This crate serves as a thin wrapper around `shelfmark-api` to provide
//! a runnable binary for production deployments without modifying
//! the core library crate.

use anyhow::Result;
use shelfmark_api::{ServerConfig, ShelfmarkServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing using the standard configuration from shelfmark-api
    shelfmark_api::init_tracing();

    tracing::info!("Starting Shelfmark suggestion server...");

    // PaaS compatibility: map the platform's $PORT to SHELFMARK_PORT
    if let Ok(port) = std::env::var("PORT") {
        if std::env::var("SHELFMARK_PORT").is_err() {
            tracing::info!("Mapping PORT {} to SHELFMARK_PORT", port);
            std::env::set_var("SHELFMARK_PORT", port);
        }
    }

    // Load server configuration from environment variables
    let config = ServerConfig::from_env();

    // Run the server with graceful shutdown support
    let server = ShelfmarkServer::new(config);
    server.run().await.map_err(|e| {
        tracing::error!("Server error during execution: {}", e);
        e
    })?;

    Ok(())
}
