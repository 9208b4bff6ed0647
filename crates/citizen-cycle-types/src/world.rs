//! Host-side world descriptors and session phases.
//!
//! The host publishes a list of known worlds with public attributes
//! (address, activity, restriction categories, level requirement). The
//! hop path either hands one of these descriptors straight to the host
//! (before a session exists) or looks it up in the live picker list.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::WorldId;

/// Restriction or activity category a world can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorldType {
    /// Members-only world.
    Members,
    /// Player-versus-player combat everywhere.
    Pvp,
    /// Bounty hunter world.
    Bounty,
    /// Protect-item prayers disabled.
    HighRisk,
    /// Entry requires a minimum total level.
    SkillTotal,
    /// Last Man Standing minigame world.
    LastManStanding,
    /// Deadman mode world.
    Deadman,
    /// Seasonal league world.
    Seasonal,
    /// Tournament world.
    Tournament,
    /// Fresh start world.
    FreshStart,
    /// Beta test world.
    Beta,
}

impl WorldType {
    /// Whether this category restricts who may (or should) enter.
    ///
    /// `Members` is not a restriction in this sense: it only gates
    /// membership, which the operator either has or does not.
    pub const fn is_restricted(self) -> bool {
        !matches!(self, Self::Members)
    }
}

/// Geographic region a world is hosted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorldRegion {
    /// United States.
    UnitedStates,
    /// United Kingdom.
    UnitedKingdom,
    /// Australia.
    Australia,
    /// Germany.
    Germany,
}

/// Public attributes of a world, as listed by the host's world service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldDescriptor {
    /// World id.
    pub id: WorldId,
    /// Connection address (host name).
    pub address: String,
    /// Activity label shown in the world list.
    #[serde(default)]
    pub activity: String,
    /// Current player count.
    #[serde(default)]
    pub players: u32,
    /// Hosting region.
    pub region: WorldRegion,
    /// Restriction and activity categories.
    #[serde(default)]
    pub types: BTreeSet<WorldType>,
    /// Minimum total level required to enter (0 = none).
    #[serde(default)]
    pub total_level_requirement: u32,
}

impl WorldDescriptor {
    /// Whether the world carries the given category.
    pub fn has_type(&self, world_type: WorldType) -> bool {
        self.types.contains(&world_type)
    }
}

/// Connectivity phase of the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// The host has not reported a phase yet.
    Unknown,
    /// The host is starting up.
    Starting,
    /// At the login screen; no session exists.
    LoginScreen,
    /// Credentials submitted, session being established.
    LoggingIn,
    /// In session, loading a region.
    Loading,
    /// In session.
    LoggedIn,
    /// Session dropped, reconnecting.
    ConnectionLost,
    /// Moving between worlds.
    Hopping,
}

impl SessionPhase {
    /// Whether the phase is before any session exists.
    pub const fn is_pre_session(self) -> bool {
        matches!(self, Self::LoginScreen)
    }

    /// Whether entering this phase ends the current session context.
    ///
    /// Pending hops and local edge state are discarded on these phases.
    pub const fn is_session_boundary(self) -> bool {
        matches!(self, Self::LoginScreen | Self::Hopping | Self::ConnectionLost)
    }
}
