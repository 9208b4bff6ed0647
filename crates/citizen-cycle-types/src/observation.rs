//! Per-world observations of the distraction cycle.
//!
//! An [`Observation`] is the latest known state of one world: whether the
//! distraction is running and the timestamps bracketing it. Observations
//! are immutable once built. A newer report for the same world replaces
//! the old value wholesale.
//!
//! [`FeedRecord`] is the wire shape exchanged with the shared feed. It is
//! lenient on the optional fields (missing timestamps decode as `0`, a
//! missing or `null` reporter decodes as an empty string) and strict on
//! `world` and `distracted`.

use serde::{Deserialize, Serialize};

use crate::ids::WorldId;

/// One record as published by the shared feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    /// The world this record describes.
    pub world: WorldId,
    /// Whether the distraction is running.
    pub distracted: bool,
    /// Epoch milliseconds when the running distraction started (0 = unset).
    #[serde(default)]
    pub distraction_start_time: i64,
    /// Epoch milliseconds when the last distraction ended (0 = unset).
    #[serde(default)]
    pub distraction_end_time: i64,
    /// Epoch milliseconds of the last report for this world (0 = unset).
    #[serde(default)]
    pub last_update_time: i64,
    /// Free-form attribution of the last reporter.
    #[serde(default)]
    pub reported_by: Option<String>,
}

/// Latest known state of a single world's distraction cycle.
///
/// All timestamps are epoch milliseconds, `0` meaning unknown. While
/// `distracted` is true only the start slot is meaningful; while false
/// only the end slot is. Both may be zero (never observed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FeedRecord", into = "FeedRecord")]
pub struct Observation {
    world: WorldId,
    distracted: bool,
    distraction_start_time: i64,
    distraction_end_time: i64,
    last_update_time: i64,
    reported_by: String,
}

impl Observation {
    /// Build an observation from all of its parts.
    pub fn new(
        world: WorldId,
        distracted: bool,
        distraction_start_time: i64,
        distraction_end_time: i64,
        last_update_time: i64,
        reported_by: impl Into<String>,
    ) -> Self {
        Self {
            world,
            distracted,
            distraction_start_time,
            distraction_end_time,
            last_update_time,
            reported_by: reported_by.into(),
        }
    }

    /// Observation for a distraction that started at `at_ms`.
    ///
    /// The end slot is zero; the update time is the edge time.
    pub fn started(world: WorldId, at_ms: i64, reported_by: impl Into<String>) -> Self {
        Self::new(world, true, at_ms, 0, at_ms, reported_by)
    }

    /// Observation for a distraction that ended at `at_ms`.
    ///
    /// The start slot is zero; the update time is the edge time.
    pub fn ended(world: WorldId, at_ms: i64, reported_by: impl Into<String>) -> Self {
        Self::new(world, false, 0, at_ms, at_ms, reported_by)
    }

    /// The world this observation describes.
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Whether the distraction is running.
    pub const fn is_distracted(&self) -> bool {
        self.distracted
    }

    /// Start of the running distraction (epoch ms, 0 = unset).
    pub const fn distraction_start_time(&self) -> i64 {
        self.distraction_start_time
    }

    /// End of the last distraction (epoch ms, 0 = unset).
    pub const fn distraction_end_time(&self) -> i64 {
        self.distraction_end_time
    }

    /// Time of the last report (epoch ms, 0 = unset).
    pub const fn last_update_time(&self) -> i64 {
        self.last_update_time
    }

    /// Who reported this observation (may be empty).
    pub fn reported_by(&self) -> &str {
        &self.reported_by
    }
}

impl From<FeedRecord> for Observation {
    fn from(record: FeedRecord) -> Self {
        Self {
            world: record.world,
            distracted: record.distracted,
            distraction_start_time: record.distraction_start_time,
            distraction_end_time: record.distraction_end_time,
            last_update_time: record.last_update_time,
            reported_by: record.reported_by.unwrap_or_default(),
        }
    }
}

impl From<Observation> for FeedRecord {
    fn from(observation: Observation) -> Self {
        Self {
            world: observation.world,
            distracted: observation.distracted,
            distraction_start_time: observation.distraction_start_time,
            distraction_end_time: observation.distraction_end_time,
            last_update_time: observation.last_update_time,
            reported_by: Some(observation.reported_by),
        }
    }
}
