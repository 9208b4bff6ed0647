//! Configuration loading and typed config structures for Citizen Cycle.
//!
//! The configuration lives in a YAML file (`citizen-cycle.yaml` by
//! default). Every field has a default, so an empty or partial file is
//! valid and a missing file means "all defaults". Misconfigured values
//! degrade gracefully instead of failing: a non-positive refresh interval
//! falls back to the default, an empty endpoint disables network actions.

use std::collections::BTreeSet;
use std::path::Path;

use citizen_cycle_types::WorldType;
use serde::Deserialize;

/// Refresh interval used when the configured one is not positive.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 5;

/// Feed endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://citizen-cycle.up.railway.app/api/citizens";

/// Environment variable overriding [`FeedConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "CITIZEN_CYCLE_ENDPOINT";

/// Environment variable overriding [`FeedConfig::authorization`].
pub const AUTHORIZATION_ENV: &str = "CITIZEN_CYCLE_AUTHORIZATION";

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CITIZEN_CYCLE_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "citizen-cycle.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CycleConfig {
    /// Shared feed connection settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Local broadcast settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Notification toggles.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Which worlds are eligible hop targets.
    #[serde(default)]
    pub hop: HopConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CycleConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the feed settings:
    /// - `CITIZEN_CYCLE_ENDPOINT` overrides `feed.endpoint`
    /// - `CITIZEN_CYCLE_AUTHORIZATION` overrides `feed.authorization`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.feed.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string (no environment overrides).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Shared feed connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// URL used for both fetch (GET) and broadcast (POST).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Value of the `authorization` header (empty = none).
    #[serde(default)]
    pub authorization: String,

    /// Seconds between refreshes. Values of zero or below use the default.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: i64,
}

impl FeedConfig {
    /// The refresh interval actually used, substituting the default for
    /// non-positive values.
    pub fn effective_refresh_interval(&self) -> u64 {
        u64::try_from(self.refresh_interval_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECONDS)
    }

    /// Whether an endpoint is configured at all.
    pub fn has_endpoint(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }

    /// Override endpoint and authorization from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(ENDPOINT_ENV) {
            self.endpoint = val;
        }
        if let Ok(val) = std::env::var(AUTHORIZATION_ENV) {
            self.authorization = val;
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            authorization: String::new(),
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}

/// Local broadcast settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Post local distraction edges to the shared feed.
    #[serde(default = "default_true")]
    pub auto_broadcast: bool,

    /// Include the local player's name in broadcasts.
    #[serde(default = "default_true")]
    pub include_identity: bool,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            auto_broadcast: true,
            include_identity: true,
        }
    }
}

/// Notification toggles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationConfig {
    /// Play a sound when the local distraction starts.
    #[serde(default = "default_true")]
    pub notify_on_distraction: bool,

    /// Play a sound when the local distraction ends.
    #[serde(default = "default_true")]
    pub notify_on_distraction_end: bool,

    /// Signal when another world enters its optimal window.
    #[serde(default)]
    pub notify_world_available: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            notify_on_distraction: true,
            notify_on_distraction_end: true,
            notify_world_available: false,
        }
    }
}

/// Hop target eligibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HopConfig {
    /// Restricted world types the operator is willing to enter.
    ///
    /// Worlds carrying any other restricted type are left off the
    /// actionable board.
    #[serde(default)]
    pub allowed_world_types: BTreeSet<WorldType>,

    /// Operator's total level; skill-total worlds above it are excluded.
    /// Zero means unknown (no level filtering).
    #[serde(default)]
    pub total_level: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

const fn default_refresh_interval() -> i64 {
    5
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}
