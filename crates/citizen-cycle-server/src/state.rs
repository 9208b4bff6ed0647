//! In-memory feed store shared by the handlers and the sweeper.
//!
//! Records are keyed by world. Each report replaces the world's record,
//! carrying the distraction timing forward from the previous one:
//!
//! - a distracted report keeps the previous start if the world was
//!   already distracted, otherwise the distraction starts now;
//! - a not-distracted report sets the end time to now only if the world
//!   was distracted, otherwise the previous end time is kept.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use citizen_cycle_types::{FeedRecord, WorldId};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

/// Reporter name recorded when a report carries none.
pub const UNKNOWN_REPORTER: &str = "Unknown";

/// Body of `POST /api/citizens`.
///
/// Every field is optional at the decoding stage so a missing `world` or
/// `distracted` can be answered with a precise error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Reporter identity.
    pub player_name: Option<String>,
    /// World the report is about.
    pub world: Option<WorldId>,
    /// Whether the distraction is running.
    pub distracted: Option<bool>,
    /// Reporter's clock at the edge, epoch milliseconds.
    pub timestamp: Option<i64>,
}

/// Distraction counts served by `GET /api/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    /// Tracked worlds.
    pub total: usize,
    /// Worlds currently distracted.
    pub distracted: usize,
}

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    records: Arc<RwLock<BTreeMap<WorldId, FeedRecord>>>,
    started_at: Instant,
}

impl AppState {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            started_at: Instant::now(),
        }
    }

    /// Time since the store was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Every record, ordered by world.
    pub async fn all(&self) -> Vec<FeedRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// The record for one world.
    pub async fn get(&self, world: WorldId) -> Option<FeedRecord> {
        self.records.read().await.get(&world).cloned()
    }

    /// Number of tracked worlds.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no world is tracked.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Distraction counts.
    pub async fn stats(&self) -> FeedStats {
        let records = self.records.read().await;
        FeedStats {
            total: records.len(),
            distracted: records.values().filter(|r| r.distracted).count(),
        }
    }

    /// Apply one report received at `now_ms` and return the stored record.
    ///
    /// A zero or missing `timestamp` is replaced by `now_ms`; an empty or
    /// missing reporter name by [`UNKNOWN_REPORTER`].
    pub async fn report(
        &self,
        world: WorldId,
        distracted: bool,
        player_name: Option<&str>,
        timestamp: Option<i64>,
        now_ms: i64,
    ) -> FeedRecord {
        let mut records = self.records.write().await;
        let previous = records.get(&world);
        let was_distracted = previous.is_some_and(|p| p.distracted);

        let distraction_start_time = match previous {
            Some(p) if distracted && was_distracted => p.distraction_start_time,
            _ if distracted => now_ms,
            _ => 0,
        };
        let distraction_end_time = if !distracted && was_distracted {
            now_ms
        } else {
            previous.map_or(0, |p| p.distraction_end_time)
        };

        let record = FeedRecord {
            world,
            distracted,
            distraction_start_time,
            distraction_end_time,
            last_update_time: timestamp.filter(|t| *t != 0).unwrap_or(now_ms),
            reported_by: Some(
                player_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNKNOWN_REPORTER)
                    .to_owned(),
            ),
        };
        records.insert(world, record.clone());
        record
    }

    /// Forget one world. Returns whether it was tracked.
    pub async fn remove(&self, world: WorldId) -> bool {
        self.records.write().await.remove(&world).is_some()
    }

    /// Drop every record whose last update is more than `stale_after`
    /// before `now_ms`. Returns the removed worlds.
    pub async fn sweep(&self, now_ms: i64, stale_after: Duration) -> Vec<WorldId> {
        let threshold = i64::try_from(stale_after.as_millis()).unwrap_or(i64::MAX);
        let mut records = self.records.write().await;
        let stale: Vec<WorldId> = records
            .values()
            .filter(|r| now_ms.saturating_sub(r.last_update_time) > threshold)
            .map(|r| r.world)
            .collect();
        for world in &stale {
            records.remove(world);
            info!(%world, "removed stale world");
        }
        stale
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
