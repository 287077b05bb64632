//! Arena Relay Server
//!
//! Binary entrypoint: wires the in-memory score store, the relay hub,
//! and the WebSocket transport together, then runs until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arena_relay::{AuthConfig, MemoryScoreStore, RelayHub, RelayServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Arena Relay Server v{}", VERSION);

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let auth = AuthConfig::from_env();
    if auth.is_configured() {
        info!("Identity token validation enabled");
    } else {
        info!("Identity token validation disabled (no AUTH_SECRET or AUTH_PUBLIC_KEY_PEM)");
    }

    let store = Arc::new(MemoryScoreStore::new());
    let hub = Arc::new(RelayHub::new(store, auth));
    let server = Arc::new(RelayServer::new(config, hub));

    // Ctrl-C triggers a graceful shutdown of the accept loop and all
    // connection tasks.
    let shutdown_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            shutdown_server.shutdown();
        }
    });

    server.run().await.context("relay server failed")?;

    info!("Server stopped");
    Ok(())
}
