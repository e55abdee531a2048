//! Moltbook sandbox server
//!
//! Serves an in-memory copy of the Moltbook API for local development.
//! Point the desktop client at it with
//! `MOLTBOOK_API_BASE=http://127.0.0.1:8787/api/v1`.

use moltbook_client::config::Config;
use moltbook_client::sandbox::{self, SandboxSettings, SandboxState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config.sandbox);

    // Bind to address from config
    let addr: SocketAddr = config
        .sandbox_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid sandbox address: {}", e))?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let public_url = format!("http://{}", listener.local_addr()?);

    let settings = SandboxSettings::from_config(&config.sandbox, &public_url);
    let state = Arc::new(RwLock::new(SandboxState::new(settings)));

    info!("Sandbox running on {}{}", public_url, sandbox::API_PREFIX);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    sandbox::serve(listener, state, shutdown_signal()).await?;

    info!("Sandbox shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
