//! Strongly-typed world identifier.
//!
//! Worlds are keyed by the small integer the host and the shared feed
//! both use. Wrapping it keeps world ids from being mixed up with
//! seconds, attempt counters, or player counts.

use serde::{Deserialize, Serialize};

/// Identifier of a single world instance (e.g. `302`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub u32);

impl WorldId {
    /// Create a world id from its numeric value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Return the inner numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for WorldId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for WorldId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<WorldId> for u32 {
    fn from(id: WorldId) -> Self {
        id.0
    }
}
