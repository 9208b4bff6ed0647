//! Seams to the shared feed.
//!
//! The core never talks HTTP itself. [`FeedSource`] is the fetch and post
//! collaborator; the `citizen-cycle-feed` crate provides the HTTP
//! implementation and tests provide in-memory ones. Implementations are
//! passed in at construction time, never looked up globally.
//!
//! Timeouts and transport retries belong to the implementation. The core
//! only sees one outcome per call.

use std::future::Future;

use citizen_cycle_types::BroadcastPayload;

/// Errors a feed collaborator can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// No endpoint is configured; the network action was skipped.
    #[error("feed endpoint is not configured")]
    NotConfigured,

    /// The request could not be completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The feed answered with a non-success status.
    #[error("HTTP {status}")]
    Status {
        /// The HTTP status code returned.
        status: u16,
    },
}

/// Fetch and post collaborator for the shared feed.
///
/// Both calls are asynchronous and resolve exactly once. The returned
/// futures must be `Send` so refreshes can run on a spawned task.
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch the raw feed body (a JSON array of records).
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure or non-success status.
    fn fetch_all(&self) -> impl Future<Output = Result<String, FeedError>> + Send;

    /// Post one local status report.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the report could not be delivered.
    fn post(
        &self,
        payload: &BroadcastPayload,
    ) -> impl Future<Output = Result<(), FeedError>> + Send;
}
