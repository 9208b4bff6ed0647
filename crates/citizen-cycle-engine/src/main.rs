//! Headless Citizen Cycle tracker.
//!
//! Wires the shared feed client, the world cache, and the per-second
//! driver together and logs the ranked world board after every refresh.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`CITIZEN_CYCLE_CONFIG`, default `citizen-cycle.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the HTTP feed client and world cache
//! 4. Start the board monitor on the signal bus
//! 5. Run the per-second driver until `Ctrl-C`
//! 6. Shut the cache down

mod error;
mod monitor;

use std::path::PathBuf;
use std::sync::Arc;

use citizen_cycle_core::availability::AvailabilityWatch;
use citizen_cycle_core::bus::EventBus;
use citizen_cycle_core::cache::WorldCache;
use citizen_cycle_core::config::{CONFIG_PATH_ENV, CycleConfig, DEFAULT_CONFIG_PATH};
use citizen_cycle_core::driver::{SecondDriver, ctrl_c};
use citizen_cycle_core::filter::WorldFilter;
use citizen_cycle_feed::HttpFeed;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::monitor::{BoardMonitor, LogNotifier};

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration or the feed client fails to load.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("citizen-cycle-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        endpoint = %config.feed.endpoint,
        refresh_interval = config.feed.effective_refresh_interval(),
        "Feed configured"
    );

    // 3. Feed client and world cache.
    let feed = Arc::new(HttpFeed::new(&config.feed).map_err(EngineError::from)?);
    let bus = EventBus::new();
    let cache = WorldCache::new(
        feed,
        bus.clone(),
        config.feed.effective_refresh_interval(),
    );
    cache.start();

    // 4. Board monitor.
    let monitor = BoardMonitor::new(
        WorldFilter::from_config(&config.hop),
        AvailabilityWatch::new(
            Arc::new(LogNotifier),
            bus.clone(),
            config.notifications.notify_world_available,
        ),
    );
    let monitor_rx = bus.subscribe();
    let monitor_cache = cache.clone();
    let monitor_task = tokio::spawn(monitor.run(monitor_rx, move || monitor_cache.snapshot()));

    // 5. Per-second driver.
    let mut driver = SecondDriver::new();
    driver.register(Arc::new(cache.clone()));
    driver.run(ctrl_c()).await;

    // 6. Shutdown.
    cache.shutdown();
    monitor_task.abort();
    info!("citizen-cycle-engine stopped");
    Ok(())
}

/// Load configuration from the file named by `CITIZEN_CYCLE_CONFIG`.
///
/// A missing file means defaults (with environment overrides applied).
/// Returns the path actually read, if any.
fn load_config() -> Result<(CycleConfig, Option<PathBuf>), EngineError> {
    let path = PathBuf::from(
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned()),
    );
    if path.exists() {
        let config = CycleConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = CycleConfig::default();
        config.feed.apply_env_overrides();
        Ok((config, None))
    }
}
