//! Shared type definitions for the Citizen Cycle world tracker.
//!
//! This crate is the single source of truth for the values that cross
//! crate boundaries: the per-world [`Observation`], the wire shapes used
//! by the shared feed, the host's world descriptors, and the signals the
//! core publishes to its consumers.
//!
//! # Modules
//!
//! - [`ids`] -- The [`WorldId`] key type
//! - [`observation`] -- [`Observation`] and its feed record encoding
//! - [`payload`] -- [`BroadcastPayload`] posted to the shared feed
//! - [`world`] -- Host world descriptors, world types, and session phases
//! - [`events`] -- [`CycleEvent`] signals produced by the core

pub mod events;
pub mod ids;
pub mod observation;
pub mod payload;
pub mod world;

// Re-export all public types at crate root for convenience.
pub use events::{CycleEvent, HopFailure};
pub use ids::WorldId;
pub use observation::{FeedRecord, Observation};
pub use payload::BroadcastPayload;
pub use world::{SessionPhase, WorldDescriptor, WorldRegion, WorldType};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Every timestamp in the system uses this unit; `0` means "unset".
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
