//! Which worlds the operator is willing to hop to.

use std::collections::{BTreeMap, BTreeSet};

use citizen_cycle_types::{WorldDescriptor, WorldId, WorldType};

use crate::config::HopConfig;

/// World-type and total-level filter for actionable views.
///
/// Restricted categories are rejected unless explicitly allowed. Worlds
/// missing from the catalog have unknown attributes and pass.
#[derive(Debug, Clone, Default)]
pub struct WorldFilter {
    allowed_types: BTreeSet<WorldType>,
    total_level: u32,
    catalog: BTreeMap<WorldId, WorldDescriptor>,
}

impl WorldFilter {
    /// A filter with an empty catalog, which admits every world.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Build a filter from the hop settings.
    pub fn from_config(config: &HopConfig) -> Self {
        Self {
            allowed_types: config.allowed_world_types.clone(),
            total_level: config.total_level,
            catalog: BTreeMap::new(),
        }
    }

    /// Replace the known world list.
    pub fn set_catalog(&mut self, worlds: impl IntoIterator<Item = WorldDescriptor>) {
        self.catalog = worlds.into_iter().map(|w| (w.id, w)).collect();
    }

    /// Builder form of [`WorldFilter::set_catalog`].
    #[must_use]
    pub fn with_catalog(mut self, worlds: impl IntoIterator<Item = WorldDescriptor>) -> Self {
        self.set_catalog(worlds);
        self
    }

    /// Whether a world id passes the filter.
    pub fn admits(&self, world: WorldId) -> bool {
        self.catalog
            .get(&world)
            .is_none_or(|descriptor| self.admits_descriptor(descriptor))
    }

    /// Whether a world with these attributes passes the filter.
    pub fn admits_descriptor(&self, descriptor: &WorldDescriptor) -> bool {
        let blocked = descriptor
            .types
            .iter()
            .any(|t| t.is_restricted() && !self.allowed_types.contains(t));
        if blocked {
            return false;
        }

        // 0 means the operator's level is unknown.
        !(descriptor.has_type(WorldType::SkillTotal)
            && self.total_level > 0
            && descriptor.total_level_requirement > self.total_level)
    }
}
