//! Announces worlds as they enter their optimal window.

use std::collections::BTreeSet;
use std::sync::Arc;

use citizen_cycle_types::{CycleEvent, WorldId};
use tracing::info;

use crate::bus::EventBus;
use crate::cache::WorldMap;
use crate::cycle::{CycleBand, CycleView};
use crate::filter::WorldFilter;
use crate::observer::{NotificationCue, Notifier};

/// Publishes [`CycleEvent::WorldAvailable`] once per window entry.
///
/// A world is announced the first time it is seen in the optimal window
/// and re-armed once it leaves. The current world, stale worlds, and
/// worlds the filter rejects are never announced.
pub struct AvailabilityWatch<N> {
    notifier: Arc<N>,
    bus: EventBus,
    enabled: bool,
    announced: BTreeSet<WorldId>,
}

impl<N: Notifier> AvailabilityWatch<N> {
    /// Create a watch. When `enabled` is false it never announces.
    pub const fn new(notifier: Arc<N>, bus: EventBus, enabled: bool) -> Self {
        Self {
            notifier,
            bus,
            enabled,
            announced: BTreeSet::new(),
        }
    }

    /// Turn announcements on or off. Turning off forgets past announcements.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.announced.clear();
        }
    }

    /// Check `snapshot` and announce newly available worlds.
    ///
    /// Returns the worlds announced by this call.
    pub fn evaluate(
        &mut self,
        snapshot: &WorldMap,
        now_ms: i64,
        current: Option<WorldId>,
        filter: &WorldFilter,
    ) -> Vec<WorldId> {
        if !self.enabled {
            return Vec::new();
        }

        let available: BTreeSet<WorldId> = snapshot
            .values()
            .filter(|obs| Some(obs.world()) != current && filter.admits(obs.world()))
            .filter(|obs| {
                let view = CycleView::at(obs, now_ms);
                !view.is_stale() && view.band() == CycleBand::Optimal
            })
            .map(citizen_cycle_types::Observation::world)
            .collect();

        self.announced.retain(|world| available.contains(world));

        let fresh: Vec<WorldId> = available
            .into_iter()
            .filter(|world| self.announced.insert(*world))
            .collect();
        for world in &fresh {
            info!(%world, "world entered optimal window");
            self.bus.publish(CycleEvent::WorldAvailable(*world));
            self.notifier.notify(NotificationCue::WorldAvailable(*world));
        }
        fresh
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use citizen_cycle_types::Observation;

    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct Cues(Mutex<Vec<NotificationCue>>);

    impl Notifier for Cues {
        fn notify(&self, cue: NotificationCue) {
            self.0.lock().unwrap().push(cue);
        }
    }

    fn snapshot(ended_ago: &[(u32, i64)]) -> WorldMap {
        ended_ago
            .iter()
            .map(|&(world, ago)| {
                let obs = Observation::new(
                    WorldId::new(world),
                    false,
                    0,
                    NOW - ago * 1000,
                    NOW - 1000,
                    "",
                );
                (obs.world(), obs)
            })
            .collect()
    }

    #[test]
    fn announces_each_window_entry_once() {
        let cues = Arc::new(Cues::default());
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let mut watch = AvailabilityWatch::new(Arc::clone(&cues), bus, true);
        let filter = WorldFilter::permissive();

        let first = snapshot(&[(302, 70), (330, 20)]);
        assert_eq!(
            watch.evaluate(&first, NOW, None, &filter),
            vec![WorldId::new(302)]
        );
        assert!(watch.evaluate(&first, NOW, None, &filter).is_empty());
        assert_eq!(
            rx.try_recv().unwrap(),
            CycleEvent::WorldAvailable(WorldId::new(302))
        );

        // 302 leaves the window, then comes back on the next cycle.
        let gone = snapshot(&[(302, 10)]);
        assert!(watch.evaluate(&gone, NOW, None, &filter).is_empty());
        assert_eq!(
            watch.evaluate(&first, NOW, None, &filter),
            vec![WorldId::new(302)]
        );
        assert_eq!(cues.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn skips_current_world_and_disabled_watch() {
        let cues = Arc::new(Cues::default());
        let filter = WorldFilter::permissive();
        let snap = snapshot(&[(302, 70)]);

        let mut watch = AvailabilityWatch::new(Arc::clone(&cues), EventBus::new(), true);
        assert!(
            watch
                .evaluate(&snap, NOW, Some(WorldId::new(302)), &filter)
                .is_empty()
        );

        watch.set_enabled(false);
        assert!(watch.evaluate(&snap, NOW, None, &filter).is_empty());
        assert!(cues.0.lock().unwrap().is_empty());
    }
}
