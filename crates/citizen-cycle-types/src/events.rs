//! Signals produced by the core for presentation and other consumers.

use serde::{Deserialize, Serialize};

use crate::ids::WorldId;
use crate::observation::Observation;
use crate::world::WorldDescriptor;

/// Why a hop attempt was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopFailure {
    /// The world picker never appeared.
    SwitcherUnavailable,
    /// The picker was open but the target world was never found.
    TargetNotFound,
    /// The requested world is not in the host's known world list.
    UnknownWorld,
}

impl core::fmt::Display for HopFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SwitcherUnavailable => write!(f, "world switcher could not be opened"),
            Self::TargetNotFound => write!(f, "target world not found in switcher"),
            Self::UnknownWorld => write!(f, "world is not in the known world list"),
        }
    }
}

/// A signal published by the core.
///
/// Subscribers receive clones; publishing never waits on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleEvent {
    /// The cache changed; carries the full current set of observations.
    DataRefreshed(Vec<Observation>),
    /// A refresh could not be applied; carries a short diagnostic.
    RefreshFailed(String),
    /// The local world crossed a distraction edge.
    LocalStatusChanged {
        /// Freshly built observation for the local world.
        observation: Observation,
        /// The new distraction state.
        distracted: bool,
    },
    /// A hop to the given world was requested.
    HopRequested(WorldDescriptor),
    /// A hop command was issued to the host.
    HopCompleted(WorldId),
    /// A hop was abandoned.
    HopFailed {
        /// The world that could not be reached.
        world: WorldId,
        /// Why the hop was abandoned.
        reason: HopFailure,
    },
    /// A world (other than the current one) entered its optimal window.
    WorldAvailable(WorldId),
}
