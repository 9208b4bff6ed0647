//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: citizen_cycle_core::config::ConfigError,
    },

    /// The feed client could not be built.
    #[error("feed error: {source}")]
    Feed {
        /// The underlying feed error.
        #[from]
        source: citizen_cycle_core::feed::FeedError,
    },
}
