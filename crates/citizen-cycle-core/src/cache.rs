//! Authoritative world-id to observation mapping, synchronized with the
//! shared feed.
//!
//! # Refresh cycle
//!
//! ```text
//! Idle --due--> Fetching --+--> Applied --+--> Idle
//!                          +--> Failed  --+
//! ```
//!
//! A second-granularity driver calls [`WorldCache::on_second_elapsed`].
//! When the configured interval has passed since the last trigger, the
//! trigger second is recorded *before* the fetch starts, so a failing
//! feed is retried on the next interval and never in a storm. At most one
//! fetch is outstanding at a time; a trigger that finds one in flight is
//! dropped.
//!
//! # Concurrency
//!
//! The map lives behind an `Arc` snapshot. A refresh parses the body
//! without holding any lock, then swaps in a whole new snapshot under a
//! short write lock. Readers clone the `Arc` and never see a half-applied
//! refresh.
//!
//! Every [`WorldCache::start`] and [`WorldCache::shutdown`] opens a new
//! generation. A fetch belongs to the generation it was issued in; a
//! response arriving after that generation ended is dropped, and its
//! in-flight claim no longer blocks the next session.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use citizen_cycle_types::{CycleEvent, Observation, WorldId};
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::cycle::CycleView;
use crate::driver::SecondListener;
use crate::feed::{FeedError, FeedSource};
use crate::filter::WorldFilter;
use crate::parse::parse_feed;

/// Immutable snapshot of the cache contents.
pub type WorldMap = BTreeMap<WorldId, Observation>;

/// Where the refresh state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No fetch outstanding.
    Idle,
    /// A fetch has been issued and has not completed.
    Fetching,
}

/// Why a refresh did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is still outstanding.
    InFlight,
    /// No feed endpoint is configured.
    NotConfigured,
    /// The cache has been shut down.
    ShutDown,
}

/// Outcome of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cache was replaced with the parsed records.
    Applied {
        /// Number of worlds now cached.
        worlds: usize,
        /// Number of malformed records skipped.
        skipped: usize,
    },
    /// The fetch or parse failed; the cache was left untouched.
    Failed(String),
    /// The refresh did not run.
    Skipped(SkipReason),
    /// The fetch completed after shutdown and was dropped.
    Discarded,
}

/// Trigger bookkeeping for the per-second driver.
#[derive(Debug, Default)]
struct RefreshSchedule {
    /// Second at which the last refresh was triggered.
    last_refresh_second: u64,
    /// Highest second delivered so far.
    last_second_seen: Option<u64>,
}

/// In-flight slot value when no fetch is outstanding.
const NO_FETCH: u64 = 0;

/// Releases the in-flight slot when a fetch finishes or is dropped.
///
/// Only releases a slot still owned by the fetch's own generation.
struct InFlightGuard<'a> {
    slot: &'a AtomicU64,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let _ = self.slot.compare_exchange(
            self.generation,
            NO_FETCH,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

struct CacheInner<F> {
    feed: Arc<F>,
    bus: EventBus,
    refresh_interval: u64,
    entries: RwLock<Arc<WorldMap>>,
    schedule: Mutex<RefreshSchedule>,
    /// Generation of the outstanding fetch, or [`NO_FETCH`].
    in_flight: AtomicU64,
    generation: AtomicU64,
    alive: AtomicBool,
}

/// Shared cache of per-world observations.
///
/// Cloning yields another handle to the same cache.
pub struct WorldCache<F> {
    inner: Arc<CacheInner<F>>,
}

impl<F> Clone for WorldCache<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: FeedSource> WorldCache<F> {
    /// Create a running cache that refreshes from `feed` every
    /// `refresh_interval` seconds (zero is treated as one).
    pub fn new(feed: Arc<F>, bus: EventBus, refresh_interval: u64) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                feed,
                bus,
                refresh_interval: refresh_interval.max(1),
                entries: RwLock::new(Arc::new(WorldMap::new())),
                schedule: Mutex::new(RefreshSchedule::default()),
                in_flight: AtomicU64::new(NO_FETCH),
                generation: AtomicU64::new(1),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Clear all state and accept refreshes again.
    pub fn start(&self) {
        self.next_generation();
        self.inner.alive.store(true, Ordering::Release);
        self.reset();
        info!(
            refresh_interval = self.inner.refresh_interval,
            "world cache started"
        );
    }

    /// Clear all state and drop any response still in flight.
    pub fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::Release);
        self.next_generation();
        self.reset();
        info!("world cache shut down");
    }

    /// Whether the cache accepts refresh results.
    pub fn is_running(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }

    /// Effective refresh interval in seconds.
    pub fn refresh_interval(&self) -> u64 {
        self.inner.refresh_interval
    }

    /// Current refresh phase.
    pub fn refresh_phase(&self) -> RefreshPhase {
        if self.inner.in_flight.load(Ordering::Acquire) != NO_FETCH {
            RefreshPhase::Fetching
        } else {
            RefreshPhase::Idle
        }
    }

    /// Record that `second` has elapsed since startup and trigger a
    /// refresh if one is due.
    ///
    /// Delivering the same (or an earlier) second again is a no-op. The
    /// fetch runs on a spawned task, so this never blocks the caller.
    /// Returns whether a refresh was triggered.
    pub fn on_second_elapsed(&self, second: u64) -> bool {
        if !self.mark_second(second) {
            return false;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                handle.spawn(async move {
                    let outcome = cache.refresh().await;
                    debug!(?outcome, "scheduled refresh finished");
                });
                true
            }
            Err(e) => {
                warn!(error = %e, "no async runtime available, refresh skipped");
                false
            }
        }
    }

    /// Fetch the feed and replace the cache with its contents.
    ///
    /// On success the whole map is swapped for the parsed records and
    /// [`CycleEvent::DataRefreshed`] is published. On failure the cache is
    /// untouched and [`CycleEvent::RefreshFailed`] is published.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.is_running() {
            return RefreshOutcome::Skipped(SkipReason::ShutDown);
        }
        let generation = self.inner.generation.load(Ordering::Acquire);
        if self
            .inner
            .in_flight
            .compare_exchange(NO_FETCH, generation, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("refresh already in flight, skipping");
            return RefreshOutcome::Skipped(SkipReason::InFlight);
        }
        let _guard = InFlightGuard {
            slot: &self.inner.in_flight,
            generation,
        };

        let result = self.inner.feed.fetch_all().await;

        if !self.is_current(generation) {
            debug!(generation, "refresh completed after shutdown, discarding");
            return RefreshOutcome::Discarded;
        }

        let body = match result {
            Ok(body) => body,
            Err(FeedError::NotConfigured) => {
                debug!("feed endpoint not configured, refresh skipped");
                return RefreshOutcome::Skipped(SkipReason::NotConfigured);
            }
            Err(e) => {
                warn!(error = %e, "failed to refresh world data");
                return self.fail(e.to_string());
            }
        };

        let parsed = match parse_feed(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "failed to parse world data");
                return self.fail(e.to_string());
            }
        };

        let fresh: WorldMap = parsed
            .observations
            .into_iter()
            .map(|obs| (obs.world(), obs))
            .collect();
        let worlds = fresh.len();
        let snapshot = Arc::new(fresh);
        if !self.swap_if_current(generation, Arc::clone(&snapshot)) {
            debug!(generation, "refresh completed after shutdown, discarding");
            return RefreshOutcome::Discarded;
        }

        debug!(worlds, skipped = parsed.skipped, "world data refreshed");
        self.inner
            .bus
            .publish(CycleEvent::DataRefreshed(snapshot.values().cloned().collect()));

        RefreshOutcome::Applied {
            worlds,
            skipped: parsed.skipped,
        }
    }

    /// Insert a locally sourced observation, replacing any entry for the
    /// same world, and publish [`CycleEvent::DataRefreshed`].
    pub fn apply_local(&self, observation: Observation) {
        let snapshot = {
            let mut guard = self
                .inner
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let mut next = WorldMap::clone(&guard);
            next.insert(observation.world(), observation);
            let next = Arc::new(next);
            *guard = Arc::clone(&next);
            next
        };
        self.inner
            .bus
            .publish(CycleEvent::DataRefreshed(snapshot.values().cloned().collect()));
    }

    /// The observation for one world, if known.
    pub fn get(&self, world: WorldId) -> Option<Observation> {
        self.snapshot().get(&world).cloned()
    }

    /// The whole cache as an immutable snapshot.
    pub fn snapshot(&self) -> Arc<WorldMap> {
        Arc::clone(
            &self
                .inner
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Number of cached worlds.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the cache holds no worlds.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Worlds whose distraction is running now and whose data is fresh.
    pub fn list_distracted_now(&self, now_ms: i64) -> Vec<Observation> {
        self.snapshot()
            .values()
            .filter(|obs| obs.is_distracted() && !CycleView::at(obs, now_ms).is_stale())
            .cloned()
            .collect()
    }

    /// Every fresh world, best priority first. Stale worlds are left out.
    ///
    /// Ties are broken by world id so the order is stable.
    pub fn ranked(&self, now_ms: i64) -> Vec<Observation> {
        let mut worlds: Vec<Observation> = self
            .snapshot()
            .values()
            .filter(|obs| !CycleView::at(obs, now_ms).is_stale())
            .cloned()
            .collect();
        worlds.sort_by_key(|obs| (CycleView::at(obs, now_ms).priority(), obs.world()));
        worlds
    }

    /// Fresh worlds the operator could hop to, best priority first.
    ///
    /// Excludes the current world and anything `filter` rejects.
    pub fn actionable(
        &self,
        now_ms: i64,
        current: Option<WorldId>,
        filter: &WorldFilter,
    ) -> Vec<Observation> {
        self.ranked(now_ms)
            .into_iter()
            .filter(|obs| Some(obs.world()) != current && filter.admits(obs.world()))
            .collect()
    }

    fn fail(&self, reason: String) -> RefreshOutcome {
        self.inner
            .bus
            .publish(CycleEvent::RefreshFailed(reason.clone()));
        RefreshOutcome::Failed(reason)
    }

    fn swap(&self, snapshot: Arc<WorldMap>) {
        let mut guard = self
            .inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }

    /// Whether the cache is running and still in `generation`.
    fn is_current(&self, generation: u64) -> bool {
        self.is_running() && self.inner.generation.load(Ordering::Acquire) == generation
    }

    /// End the current generation and release its in-flight claim.
    fn next_generation(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.in_flight.store(NO_FETCH, Ordering::Release);
    }

    /// Swap in `snapshot` unless `generation` ended first.
    fn swap_if_current(&self, generation: u64, snapshot: Arc<WorldMap>) -> bool {
        let mut guard = self
            .inner
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(generation) {
            return false;
        }
        *guard = snapshot;
        true
    }

    fn reset(&self) {
        self.swap(Arc::new(WorldMap::new()));
        let mut schedule = self
            .inner
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *schedule = RefreshSchedule::default();
    }

    /// Record `second` and report whether a refresh is due now.
    fn mark_second(&self, second: u64) -> bool {
        let mut schedule = self
            .inner
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if schedule.last_second_seen.is_some_and(|seen| second <= seen) {
            return false;
        }
        schedule.last_second_seen = Some(second);

        if second.saturating_sub(schedule.last_refresh_second) >= self.inner.refresh_interval {
            schedule.last_refresh_second = second;
            return true;
        }
        false
    }
}

impl<F: FeedSource> SecondListener for WorldCache<F> {
    fn on_second(&self, second: u64) {
        self.on_second_elapsed(second);
    }
}
