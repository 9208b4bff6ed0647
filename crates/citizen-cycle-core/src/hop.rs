//! Hop coordinator: moves the operator to a chosen world.
//!
//! # State machine
//!
//! ```text
//!            request (in session)
//! Idle ------------------------------> AwaitingSwitcherUi
//!  ^                                     |  picker open
//!  |                                     v
//!  +---- abort (bounds exceeded) --- AwaitingWorldList
//!  |                                     |  target listed
//!  +------------- Hopping <--------------+
//! ```
//!
//! The coordinator is evaluated once per host tick and is strictly
//! single-threaded: one target at a time, a new request replaces the old
//! one and resets both attempt counters. Opening the picker is retried at
//! most [`SWITCHER_MAX_ATTEMPTS`] times and locating the target at most
//! [`HOP_MAX_ATTEMPTS`] times before the hop is abandoned.
//!
//! A request made at the login screen skips the loop entirely: there is
//! no live picker, so the descriptor goes straight to the host's
//! world-change entry point.

use citizen_cycle_types::{CycleEvent, HopFailure, SessionPhase, WorldDescriptor, WorldId};
use tracing::{debug, info, warn};

use crate::bus::EventBus;

/// Ticks spent trying to open the world picker before giving up.
pub const SWITCHER_MAX_ATTEMPTS: u32 = 3;

/// Ticks spent looking for the target in an open picker before giving up.
pub const HOP_MAX_ATTEMPTS: u32 = 5;

/// Host-side surface the coordinator drives.
pub trait HostEnvironment {
    /// The world the operator is on, if in session.
    fn current_world(&self) -> Option<WorldId>;

    /// Current session phase.
    fn phase(&self) -> SessionPhase;

    /// Whether the interactive world picker is on screen.
    fn is_world_switcher_open(&self) -> bool;

    /// Ask the host to open the world picker.
    fn open_world_switcher(&mut self);

    /// The worlds listed in the open picker, if the host has loaded them.
    fn world_list(&self) -> Option<Vec<WorldDescriptor>>;

    /// Hop to a world listed in the picker.
    fn hop_to_world(&mut self, world: &WorldDescriptor);

    /// Select a world from the login screen.
    fn change_world(&mut self, world: &WorldDescriptor);
}

/// Where the coordinator is in the hop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopState {
    /// No hop pending.
    Idle,
    /// Waiting for the host to show the world picker.
    AwaitingSwitcherUi,
    /// Picker open, target not located yet.
    AwaitingWorldList,
    /// Target located and the hop command issued.
    Hopping,
}

/// How a hop request was taken up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopStart {
    /// Handed straight to the host's world-change entry point.
    Immediate,
    /// Queued for the per-tick retry loop.
    Queued,
    /// The operator is already on the requested world.
    AlreadyOnWorld,
    /// The host is between phases; the request was dropped.
    Ignored,
}

/// Result of one coordinator tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopTick {
    /// Nothing pending.
    Idle,
    /// Still working; carries the current state.
    Pending(HopState),
    /// The hop command was issued.
    Hopped(WorldId),
    /// The hop was abandoned.
    Failed(HopFailure),
}

/// Drives the host through a bounded, multi-step world hop.
pub struct HopCoordinator<H> {
    host: H,
    bus: EventBus,
    state: HopState,
    target: Option<WorldId>,
    switcher_attempts: u32,
    hop_attempts: u32,
}

impl<H: HostEnvironment> HopCoordinator<H> {
    /// Create an idle coordinator driving `host`.
    pub const fn new(host: H, bus: EventBus) -> Self {
        Self {
            host,
            bus,
            state: HopState::Idle,
            target: None,
            switcher_attempts: 0,
            hop_attempts: 0,
        }
    }

    /// The driven host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the driven host.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current state.
    pub const fn state(&self) -> HopState {
        self.state
    }

    /// The pending target, if any.
    pub const fn target(&self) -> Option<WorldId> {
        self.target
    }

    /// Ticks spent trying to open the picker for the current target.
    pub const fn switcher_attempts(&self) -> u32 {
        self.switcher_attempts
    }

    /// Ticks spent scanning the picker for the current target.
    pub const fn hop_attempts(&self) -> u32 {
        self.hop_attempts
    }

    /// Request a hop to a world by id, resolving it against `known`.
    ///
    /// Publishes [`CycleEvent::HopRequested`] for a known world.
    ///
    /// # Errors
    ///
    /// Returns [`HopFailure::UnknownWorld`] (and publishes
    /// [`CycleEvent::HopFailed`]) if `world` is not in `known`.
    pub fn request_hop_by_id(
        &mut self,
        world: WorldId,
        known: &[WorldDescriptor],
    ) -> Result<HopStart, HopFailure> {
        let Some(descriptor) = known.iter().find(|d| d.id == world) else {
            warn!(%world, "hop requested to unknown world");
            self.fail(world, HopFailure::UnknownWorld);
            return Err(HopFailure::UnknownWorld);
        };
        self.bus
            .publish(CycleEvent::HopRequested(descriptor.clone()));
        Ok(self.request(descriptor))
    }

    /// Take up a hop request.
    ///
    /// At the login screen the host switches immediately. In session the
    /// target is queued for [`HopCoordinator::tick`], replacing any earlier
    /// target, unless the operator is already on it. In any other phase the
    /// request is dropped.
    pub fn request(&mut self, world: &WorldDescriptor) -> HopStart {
        match self.host.phase() {
            phase if phase.is_pre_session() => {
                info!(world = %world.id, "changing world from login screen");
                self.reset();
                self.host.change_world(world);
                self.bus.publish(CycleEvent::HopCompleted(world.id));
                HopStart::Immediate
            }
            SessionPhase::LoggedIn if self.host.current_world() == Some(world.id) => {
                debug!(world = %world.id, "already on requested world");
                self.reset();
                HopStart::AlreadyOnWorld
            }
            SessionPhase::LoggedIn => {
                debug!(world = %world.id, "queueing hop");
                self.reset();
                self.target = Some(world.id);
                self.state = HopState::AwaitingSwitcherUi;
                HopStart::Queued
            }
            phase => {
                debug!(world = %world.id, ?phase, "hop request ignored outside session");
                HopStart::Ignored
            }
        }
    }

    /// Advance the hop sequence by one host tick.
    pub fn tick(&mut self) -> HopTick {
        let Some(target) = self.target else {
            return HopTick::Idle;
        };

        if !self.host.is_world_switcher_open() {
            self.state = HopState::AwaitingSwitcherUi;
            self.host.open_world_switcher();
            self.switcher_attempts = self.switcher_attempts.saturating_add(1);
            if self.switcher_attempts >= SWITCHER_MAX_ATTEMPTS {
                warn!(
                    world = %target,
                    attempts = self.switcher_attempts,
                    "world switcher did not open"
                );
                return self.abort(target, HopFailure::SwitcherUnavailable);
            }
            return HopTick::Pending(self.state);
        }

        self.state = HopState::AwaitingWorldList;
        self.hop_attempts = self.hop_attempts.saturating_add(1);
        if self.hop_attempts >= HOP_MAX_ATTEMPTS {
            warn!(world = %target, attempts = self.hop_attempts, "unable to hop");
            return self.abort(target, HopFailure::TargetNotFound);
        }

        let Some(worlds) = self.host.world_list() else {
            return HopTick::Pending(self.state);
        };
        let Some(entry) = worlds.iter().find(|w| w.id == target) else {
            return HopTick::Pending(self.state);
        };

        self.state = HopState::Hopping;
        info!(world = %target, "hopping");
        self.host.hop_to_world(entry);
        self.reset();
        self.bus.publish(CycleEvent::HopCompleted(target));
        HopTick::Hopped(target)
    }

    /// React to a host phase change. Session boundaries drop any pending hop.
    pub fn on_phase_changed(&mut self, phase: SessionPhase) {
        if phase.is_session_boundary() && self.target.is_some() {
            debug!(?phase, "session boundary, dropping pending hop");
        }
        if phase.is_session_boundary() {
            self.reset();
        }
    }

    /// Clear the target and both attempt counters.
    pub const fn reset(&mut self) {
        self.target = None;
        self.switcher_attempts = 0;
        self.hop_attempts = 0;
        self.state = HopState::Idle;
    }

    fn abort(&mut self, target: WorldId, reason: HopFailure) -> HopTick {
        self.reset();
        self.fail(target, reason);
        HopTick::Failed(reason)
    }

    fn fail(&self, world: WorldId, reason: HopFailure) {
        self.bus.publish(CycleEvent::HopFailed { world, reason });
    }
}
