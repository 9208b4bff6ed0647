//! Feed server binary.
//!
//! Reads `HOST`/`PORT` from the environment (default `0.0.0.0:3000`) and
//! serves the shared distraction feed until `Ctrl-C`.

use std::sync::Arc;

use citizen_cycle_server::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = ServerConfig::from_env();
    info!(host = %config.host, port = config.port, "citizen-cycle-server starting");

    start_server(&config, Arc::new(AppState::new())).await?;

    info!("citizen-cycle-server stopped");
    Ok(())
}
