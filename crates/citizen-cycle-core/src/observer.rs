//! Local distraction observer.
//!
//! The observer is the only writer of locally sourced observations. Each
//! host tick it receives a [`LocalFrame`] describing what the host sees on
//! the current world and compares the distraction flag with the previous
//! frame. On a false-to-true or true-to-false edge it:
//!
//! 1. builds a fresh [`Observation`] with the edge time in the right slot,
//! 2. publishes [`CycleEvent::LocalStatusChanged`] and upserts the cache,
//! 3. posts a [`BroadcastPayload`] to the feed (fire and forget),
//! 4. plays a notification cue.
//!
//! Steps 3 and 4 are each guarded by a [`BroadcastLatch`] per edge kind,
//! so one edge yields at most one post and one cue. The latches of an
//! edge reset when the opposite edge fires.

use std::sync::Arc;

use citizen_cycle_types::{BroadcastPayload, CycleEvent, Observation, SessionPhase, WorldId};
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::cache::WorldCache;
use crate::config::{BroadcastConfig, NotificationConfig};
use crate::feed::FeedSource;

/// A sound the host should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCue {
    /// The local distraction started.
    DistractionStarted,
    /// The local distraction ended.
    DistractionEnded,
    /// Another world entered its optimal window.
    WorldAvailable(WorldId),
}

/// Host-side sink for notification cues.
pub trait Notifier: Send + Sync {
    /// Play a cue. Must not block.
    fn notify(&self, cue: NotificationCue);
}

/// What the host sees on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFrame {
    /// Current session phase.
    pub phase: SessionPhase,
    /// The world the operator is on.
    pub world: WorldId,
    /// Local player name, if a player is loaded.
    pub player_name: Option<String>,
    /// Whether the operator is close enough to observe the event.
    pub in_range: bool,
    /// Whether the event is running right now.
    pub distracted: bool,
    /// Epoch milliseconds of this tick.
    pub now_ms: i64,
}

/// One-shot guard for a single edge kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastLatch {
    /// The action has not fired for the current edge.
    #[default]
    NotYetBroadcast,
    /// The action fired; further attempts are suppressed until reset.
    Broadcast,
}

impl BroadcastLatch {
    /// Fire the latch. Returns `true` only on the first call after a reset.
    pub const fn fire(&mut self) -> bool {
        match self {
            Self::NotYetBroadcast => {
                *self = Self::Broadcast;
                true
            }
            Self::Broadcast => false,
        }
    }

    /// Re-arm the latch.
    pub const fn reset(&mut self) {
        *self = Self::NotYetBroadcast;
    }
}

/// Post and cue latches for one edge kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EdgeLatches {
    post: BroadcastLatch,
    cue: BroadcastLatch,
}

impl EdgeLatches {
    const fn reset(&mut self) {
        self.post.reset();
        self.cue.reset();
    }
}

/// Watches the local world and reports distraction edges.
pub struct LocalDistractionObserver<F, N> {
    feed: Arc<F>,
    cache: WorldCache<F>,
    bus: EventBus,
    notifier: Arc<N>,
    broadcast: BroadcastConfig,
    notifications: NotificationConfig,
    was_distracted: bool,
    started: EdgeLatches,
    ended: EdgeLatches,
}

impl<F: FeedSource, N: Notifier + 'static> LocalDistractionObserver<F, N> {
    /// Create an observer with no edge history.
    pub fn new(
        feed: Arc<F>,
        cache: WorldCache<F>,
        bus: EventBus,
        notifier: Arc<N>,
        broadcast: BroadcastConfig,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            feed,
            cache,
            bus,
            notifier,
            broadcast,
            notifications,
            was_distracted: false,
            started: EdgeLatches::default(),
            ended: EdgeLatches::default(),
        }
    }

    /// Whether the last evaluated frame had the event running.
    pub const fn is_distracted(&self) -> bool {
        self.was_distracted
    }

    /// Replace the broadcast and notification settings.
    pub fn reconfigure(&mut self, broadcast: BroadcastConfig, notifications: NotificationConfig) {
        self.broadcast = broadcast;
        self.notifications = notifications;
    }

    /// Forget all edge history.
    pub fn reset(&mut self) {
        self.was_distracted = false;
        self.started.reset();
        self.ended.reset();
    }

    /// React to a host phase change. Session boundaries clear edge history.
    pub fn on_phase_changed(&mut self, phase: SessionPhase) {
        if phase.is_session_boundary() {
            debug!(?phase, "session boundary, resetting local observer");
            self.reset();
        }
    }

    /// Evaluate one host tick.
    ///
    /// Frames outside an active session, without a local player, or out of
    /// range are ignored and leave the edge history untouched. Returns the
    /// observation built for an edge, if one fired.
    pub fn on_tick(&mut self, frame: &LocalFrame) -> Option<Observation> {
        if frame.phase != SessionPhase::LoggedIn || !frame.in_range {
            return None;
        }
        let player = frame.player_name.as_deref()?;

        let edge = match (self.was_distracted, frame.distracted) {
            (false, true) => Some(self.distraction_started(frame, player)),
            (true, false) => Some(self.distraction_ended(frame, player)),
            _ => None,
        };
        self.was_distracted = frame.distracted;
        edge
    }

    fn distraction_started(&mut self, frame: &LocalFrame, player: &str) -> Observation {
        debug!(world = %frame.world, "local distraction started");
        self.ended.reset();

        let observation = Observation::started(frame.world, frame.now_ms, player);
        self.report(&observation, true);

        if self.broadcast.auto_broadcast && self.started.post.fire() {
            self.post(frame, player, true);
        }
        if self.notifications.notify_on_distraction && self.started.cue.fire() {
            self.notifier.notify(NotificationCue::DistractionStarted);
        }
        observation
    }

    fn distraction_ended(&mut self, frame: &LocalFrame, player: &str) -> Observation {
        debug!(world = %frame.world, "local distraction ended");
        self.started.reset();

        let observation = Observation::ended(frame.world, frame.now_ms, player);
        self.report(&observation, false);

        if self.broadcast.auto_broadcast && self.ended.post.fire() {
            self.post(frame, player, false);
        }
        if self.notifications.notify_on_distraction_end && self.ended.cue.fire() {
            self.notifier.notify(NotificationCue::DistractionEnded);
        }
        observation
    }

    fn report(&self, observation: &Observation, distracted: bool) {
        self.bus.publish(CycleEvent::LocalStatusChanged {
            observation: observation.clone(),
            distracted,
        });
        self.cache.apply_local(observation.clone());
    }

    fn post(&self, frame: &LocalFrame, player: &str, distracted: bool) {
        let payload = BroadcastPayload {
            player_name: if self.broadcast.include_identity {
                player.to_owned()
            } else {
                String::new()
            },
            world: frame.world,
            distracted,
            timestamp: frame.now_ms,
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(world = %frame.world, "no async runtime available, broadcast dropped");
            return;
        };
        let feed = Arc::clone(&self.feed);
        handle.spawn(async move {
            match feed.post(&payload).await {
                Ok(()) => debug!(world = %payload.world, distracted, "broadcast local status"),
                Err(e) => warn!(error = %e, world = %payload.world, "failed to broadcast local status"),
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::feed::FeedError;

    #[derive(Default)]
    struct RecordingFeed {
        posts: Mutex<Vec<BroadcastPayload>>,
    }

    impl FeedSource for RecordingFeed {
        async fn fetch_all(&self) -> Result<String, FeedError> {
            Ok("[]".to_owned())
        }

        async fn post(&self, payload: &BroadcastPayload) -> Result<(), FeedError> {
            self.posts.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        cues: Mutex<Vec<NotificationCue>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, cue: NotificationCue) {
            self.cues.lock().unwrap().push(cue);
        }
    }

    struct Harness {
        feed: Arc<RecordingFeed>,
        notifier: Arc<RecordingNotifier>,
        cache: WorldCache<RecordingFeed>,
        bus: EventBus,
        observer: LocalDistractionObserver<RecordingFeed, RecordingNotifier>,
    }

    fn harness(broadcast: BroadcastConfig, notifications: NotificationConfig) -> Harness {
        let feed = Arc::new(RecordingFeed::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let bus = EventBus::new();
        let cache = WorldCache::new(Arc::clone(&feed), bus.clone(), 5);
        let observer = LocalDistractionObserver::new(
            Arc::clone(&feed),
            cache.clone(),
            bus.clone(),
            Arc::clone(&notifier),
            broadcast,
            notifications,
        );
        Harness {
            feed,
            notifier,
            cache,
            bus,
            observer,
        }
    }

    fn frame(distracted: bool, now_ms: i64) -> LocalFrame {
        LocalFrame {
            phase: SessionPhase::LoggedIn,
            world: WorldId::new(302),
            player_name: Some("Zezima".to_owned()),
            in_range: true,
            distracted,
            now_ms,
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn each_edge_posts_and_notifies_once() {
        let mut h = harness(BroadcastConfig::default(), NotificationConfig::default());
        let mut rx = h.bus.subscribe();

        let started = h.observer.on_tick(&frame(true, 1_000)).unwrap();
        assert!(started.is_distracted());
        assert_eq!(started.distraction_start_time(), 1_000);
        assert_eq!(started.distraction_end_time(), 0);

        // Steady state: no further edges.
        assert!(h.observer.on_tick(&frame(true, 1_600)).is_none());
        assert!(h.observer.on_tick(&frame(true, 2_200)).is_none());

        let ended = h.observer.on_tick(&frame(false, 9_000)).unwrap();
        assert!(!ended.is_distracted());
        assert_eq!(ended.distraction_start_time(), 0);
        assert_eq!(ended.distraction_end_time(), 9_000);
        settle().await;

        let posts = h.feed.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts.first().unwrap().player_name, "Zezima");
        assert!(posts.first().unwrap().distracted);
        assert_eq!(posts.last().unwrap().timestamp, 9_000);
        assert_eq!(
            *h.notifier.cues.lock().unwrap(),
            vec![
                NotificationCue::DistractionStarted,
                NotificationCue::DistractionEnded
            ]
        );

        assert!(matches!(
            rx.recv().await.unwrap(),
            CycleEvent::LocalStatusChanged { distracted: true, .. }
        ));
        assert!(!h.cache.get(WorldId::new(302)).unwrap().is_distracted());
    }

    #[tokio::test]
    async fn broadcast_respects_settings() {
        let mut h = harness(
            BroadcastConfig {
                auto_broadcast: true,
                include_identity: false,
            },
            NotificationConfig {
                notify_on_distraction: false,
                notify_on_distraction_end: false,
                notify_world_available: false,
            },
        );
        h.observer.on_tick(&frame(true, 1_000));
        settle().await;
        assert_eq!(h.feed.posts.lock().unwrap().first().unwrap().player_name, "");
        assert!(h.notifier.cues.lock().unwrap().is_empty());

        h.observer.reconfigure(
            BroadcastConfig {
                auto_broadcast: false,
                include_identity: true,
            },
            NotificationConfig::default(),
        );
        h.observer.on_tick(&frame(false, 2_000));
        settle().await;
        assert_eq!(h.feed.posts.lock().unwrap().len(), 1);
        // The edge is still reported locally.
        assert!(h.cache.get(WorldId::new(302)).is_some());
    }

    #[tokio::test]
    async fn ignored_frames_keep_history() {
        let mut h = harness(BroadcastConfig::default(), NotificationConfig::default());
        h.observer.on_tick(&frame(true, 1_000));

        let mut away = frame(false, 2_000);
        away.in_range = false;
        assert!(h.observer.on_tick(&away).is_none());

        let mut loading = frame(false, 2_500);
        loading.phase = SessionPhase::Loading;
        assert!(h.observer.on_tick(&loading).is_none());
        assert!(h.observer.is_distracted());

        assert!(h.observer.on_tick(&frame(false, 3_000)).is_some());
    }

    #[tokio::test]
    async fn session_boundary_clears_history() {
        let mut h = harness(BroadcastConfig::default(), NotificationConfig::default());
        h.observer.on_tick(&frame(true, 1_000));

        h.observer.on_phase_changed(SessionPhase::Loading);
        assert!(h.observer.is_distracted());

        h.observer.on_phase_changed(SessionPhase::Hopping);
        assert!(!h.observer.is_distracted());
        // After the reset, a running event counts as a fresh start.
        assert!(h.observer.on_tick(&frame(true, 5_000)).is_some());
    }

    #[test]
    fn latch_fires_once_until_reset() {
        let mut latch = BroadcastLatch::default();
        assert!(latch.fire());
        assert!(!latch.fire());
        latch.reset();
        assert!(latch.fire());
    }
}
