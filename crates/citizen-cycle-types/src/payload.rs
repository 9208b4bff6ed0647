//! Broadcast payload posted to the shared feed on a local edge.

use serde::{Deserialize, Serialize};

use crate::ids::WorldId;

/// A single local status report, as accepted by the feed's POST endpoint.
///
/// The feed derives start/end timestamps itself from consecutive reports,
/// so the payload only carries the edge time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastPayload {
    /// Reporter identity (empty when identity is withheld).
    pub player_name: String,
    /// The world the report is about.
    pub world: WorldId,
    /// Whether the distraction is running.
    pub distracted: bool,
    /// Epoch milliseconds of the edge.
    pub timestamp: i64,
}
