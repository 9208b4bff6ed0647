//! Server configuration, read from the environment.

use std::time::Duration;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 3000;

/// Records older than this are swept.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// How often the sweep runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for the feed server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
    /// Age after which a record is swept.
    pub stale_after: Duration,
    /// Interval between sweeps.
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            stale_after: DEFAULT_STALE_AFTER,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Build a config from `HOST` and `PORT`, falling back to defaults.
    ///
    /// An unparsable `PORT` is ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_owned();
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            config.port = port;
        }
        config
    }
}
