//! Feed server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::router::build_router;
use crate::state::AppState;
use crate::sweeper::spawn_sweeper;

/// Errors that can occur when starting or running the feed server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind, start the sweeper, and serve until `Ctrl-C`.
///
/// # Errors
///
/// Returns an error if the address is invalid, the listener cannot bind,
/// or serving fails.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    let sweeper = spawn_sweeper(
        Arc::clone(&state),
        config.sweep_interval,
        config.stale_after,
    );
    let router = build_router(state);

    info!(%addr, "feed server listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();

    served.map_err(|e| ServerError::Serve(e.to_string()))
}

/// Resolve on `Ctrl-C`, or at once if the handler cannot be installed.
async fn shutdown_signal() {
    signal_outcome(tokio::signal::ctrl_c().await);
}

/// Log how the wait for `Ctrl-C` ended and report whether the signal
/// was actually received.
fn signal_outcome(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!("shutdown signal received");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler, stopping server");
            false
        }
    }
}
