//! Temporal inference over a single world's last-known timestamps.
//!
//! The distraction recurs on a fixed empirical period. Given only the
//! last observed start/end of the event on a world, this module estimates
//! where the world sits in its cycle and ranks it against other worlds.
//!
//! # Design Principles
//!
//! - Everything here is a pure function of an [`Observation`] and the
//!   current time in epoch milliseconds. No I/O, no interior state.
//! - Every derivation is defined for all-zero input. "Not applicable"
//!   results are `None`; "never updated" is the `i64::MAX` sentinel.
//! - Arithmetic saturates. A timestamp in the future (skewed reporter
//!   clock) clamps elapsed time to zero rather than going negative.
//!
//! # Timing bands
//!
//! Bands are measured in whole seconds since the last distraction ended:
//!
//! ```text
//! 0 ........ 50 ........ 68 ............ 83 ........
//!   waiting    approaching   optimal window   overdue
//! ```
//!
//! The "next distraction" estimate is a linear extrapolation from the end
//! of the last observed distraction. Observed cycles vary by a few
//! seconds either way, so treat it as accurate to roughly +/- 5 s.

use citizen_cycle_types::Observation;

/// Length of one distraction cycle in seconds.
pub const CYCLE_SECONDS: i64 = 83;

/// First second (inclusive) of the optimal hop window after a distraction ends.
pub const WINDOW_START_SECONDS: i64 = 68;

/// Last second (inclusive) of the optimal hop window after a distraction ends.
pub const WINDOW_END_SECONDS: i64 = 83;

/// First second (inclusive) of the approaching band.
pub const APPROACHING_START_SECONDS: i64 = 50;

/// Seconds without an update after which an observation is stale (two cycles).
pub const STALE_AFTER_SECONDS: i64 = CYCLE_SECONDS.saturating_mul(2);

/// Milliseconds per second.
const MILLIS_PER_SECOND: i64 = 1000;

/// Cap on the intra-tier offset so tiers never overlap.
const TIER_SPAN: i64 = 99;

/// Which timing band a world is in. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleBand {
    /// Inside the optimal hop window.
    Optimal,
    /// Closing in on the optimal window.
    Approaching,
    /// The distraction is running now.
    Distracted,
    /// Anything else: waiting, overdue, or no timing data.
    Other,
}

/// Sort key for worlds. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriorityScore(pub u32);

impl PriorityScore {
    /// Score reserved for stale observations; always sorts last.
    pub const STALE: Self = Self(u32::MAX);

    /// Score for observations with no usable timing data.
    pub const NO_DATA: Self = Self(u32::MAX.saturating_sub(1));

    /// Base of the optimal-window tier.
    const OPTIMAL_BASE: u32 = 0;
    /// Base of the approaching tier.
    const APPROACHING_BASE: u32 = 100;
    /// Base of the distracted tier.
    const DISTRACTED_BASE: u32 = 200;
    /// Base of the waiting part of the other tier.
    const WAITING_BASE: u32 = 300;
    /// Base of the overdue part of the other tier.
    const OVERDUE_BASE: u32 = 400;

    /// Build a score from a tier base and a non-negative offset.
    fn tiered(base: u32, offset: i64) -> Self {
        let clamped = offset.clamp(0, TIER_SPAN);
        let offset = u32::try_from(clamped).unwrap_or(0);
        Self(base.saturating_add(offset))
    }
}

/// Whole seconds between two epoch-millisecond instants, clamped at zero.
fn elapsed_seconds(now_ms: i64, since_ms: i64) -> i64 {
    now_ms
        .saturating_sub(since_ms)
        .max(0)
        .checked_div(MILLIS_PER_SECOND)
        .unwrap_or(0)
}

/// An observation viewed at a fixed instant.
///
/// ```
/// use citizen_cycle_core::cycle::CycleView;
/// use citizen_cycle_types::{Observation, WorldId};
///
/// let now = 1_700_000_100_000;
/// let obs = Observation::ended(WorldId::new(302), now - 70_000, "");
/// let view = CycleView::at(&obs, now);
/// assert!(view.is_in_optimal_window());
/// assert_eq!(view.seconds_until_next_distraction(), Some(13));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CycleView<'a> {
    observation: &'a Observation,
    now_ms: i64,
}

impl<'a> CycleView<'a> {
    /// View `observation` as of `now_ms` (epoch milliseconds).
    pub const fn at(observation: &'a Observation, now_ms: i64) -> Self {
        Self {
            observation,
            now_ms,
        }
    }

    /// The underlying observation.
    pub const fn observation(&self) -> &'a Observation {
        self.observation
    }

    /// Seconds since the world was last reported on.
    ///
    /// Returns `i64::MAX` if the world was never updated.
    pub fn seconds_since_update(&self) -> i64 {
        let last = self.observation.last_update_time();
        if last == 0 {
            return i64::MAX;
        }
        elapsed_seconds(self.now_ms, last)
    }

    /// Whether the observation is too old to trust (two cycles without update).
    pub fn is_stale(&self) -> bool {
        self.seconds_since_update() > STALE_AFTER_SECONDS
    }

    /// How long the running distraction has lasted, in seconds.
    ///
    /// Zero unless the distraction is running with a known start.
    pub fn distraction_duration_seconds(&self) -> i64 {
        let start = self.observation.distraction_start_time();
        if !self.observation.is_distracted() || start == 0 {
            return 0;
        }
        elapsed_seconds(self.now_ms, start)
    }

    /// Seconds since the last distraction ended.
    ///
    /// `None` while distracted or when no end time is known.
    pub fn seconds_since_distraction_ended(&self) -> Option<i64> {
        let end = self.observation.distraction_end_time();
        if self.observation.is_distracted() || end == 0 {
            return None;
        }
        Some(elapsed_seconds(self.now_ms, end))
    }

    /// Estimated seconds until the next distraction starts.
    ///
    /// `Some(0)` while distracted, `None` without end-time data. This is an
    /// extrapolation from the last end time, not a measurement.
    pub fn seconds_until_next_distraction(&self) -> Option<i64> {
        if self.observation.is_distracted() {
            return Some(0);
        }
        self.seconds_since_distraction_ended()
            .map(|since| CYCLE_SECONDS.saturating_sub(since).max(0))
    }

    /// Whether the world is inside the optimal hop window.
    pub fn is_in_optimal_window(&self) -> bool {
        self.seconds_since_distraction_ended()
            .is_some_and(|since| (WINDOW_START_SECONDS..=WINDOW_END_SECONDS).contains(&since))
    }

    /// Whether the world is closing in on the optimal window.
    pub fn is_approaching(&self) -> bool {
        self.seconds_since_distraction_ended()
            .is_some_and(|since| (APPROACHING_START_SECONDS..WINDOW_START_SECONDS).contains(&since))
    }

    /// The timing band the world is in.
    pub fn band(&self) -> CycleBand {
        if self.observation.is_distracted() {
            CycleBand::Distracted
        } else if self.is_in_optimal_window() {
            CycleBand::Optimal
        } else if self.is_approaching() {
            CycleBand::Approaching
        } else {
            CycleBand::Other
        }
    }

    /// Total-order priority score; lower should be acted on first.
    ///
    /// Tiers: optimal window, approaching, distracted, everything else.
    /// Within a tier, the world closer to being actionable sorts first.
    /// Stale observations always score [`PriorityScore::STALE`].
    pub fn priority(&self) -> PriorityScore {
        if self.is_stale() {
            return PriorityScore::STALE;
        }

        match self.band() {
            CycleBand::Optimal => {
                let since = self.seconds_since_distraction_ended().unwrap_or(0);
                PriorityScore::tiered(
                    PriorityScore::OPTIMAL_BASE,
                    WINDOW_END_SECONDS.saturating_sub(since),
                )
            }
            CycleBand::Approaching => {
                let since = self.seconds_since_distraction_ended().unwrap_or(0);
                PriorityScore::tiered(
                    PriorityScore::APPROACHING_BASE,
                    WINDOW_START_SECONDS.saturating_sub(since),
                )
            }
            CycleBand::Distracted => PriorityScore::tiered(
                PriorityScore::DISTRACTED_BASE,
                self.distraction_duration_seconds(),
            ),
            CycleBand::Other => match self.seconds_since_distraction_ended() {
                Some(since) if since < APPROACHING_START_SECONDS => PriorityScore::tiered(
                    PriorityScore::WAITING_BASE,
                    APPROACHING_START_SECONDS.saturating_sub(since),
                ),
                Some(since) => PriorityScore::tiered(
                    PriorityScore::OVERDUE_BASE,
                    since.saturating_sub(WINDOW_END_SECONDS),
                ),
                None => PriorityScore::NO_DATA,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use citizen_cycle_types::WorldId;

    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn ended_ago(seconds: i64) -> Observation {
        Observation::new(WorldId::new(302), false, 0, NOW - seconds * 1000, NOW - 1000, "")
    }

    fn distracted_for(seconds: i64) -> Observation {
        Observation::new(WorldId::new(302), true, NOW - seconds * 1000, 0, NOW - 1000, "")
    }

    #[test]
    fn unset_update_time_is_stale() {
        let obs = Observation::new(WorldId::new(1), false, 0, 0, 0, "");
        let view = CycleView::at(&obs, NOW);
        assert_eq!(view.seconds_since_update(), i64::MAX);
        assert!(view.is_stale());
        assert_eq!(view.priority(), PriorityScore::STALE);
    }

    #[test]
    fn all_zero_observation_is_defined() {
        let obs = Observation::new(WorldId::new(1), false, 0, 0, 0, "");
        let view = CycleView::at(&obs, 0);
        assert_eq!(view.distraction_duration_seconds(), 0);
        assert_eq!(view.seconds_since_distraction_ended(), None);
        assert_eq!(view.seconds_until_next_distraction(), None);
        assert!(!view.is_in_optimal_window());
        assert!(!view.is_approaching());
        assert_eq!(view.band(), CycleBand::Other);
    }

    #[test]
    fn stale_after_two_cycles() {
        let fresh = Observation::ended(WorldId::new(1), NOW - 166_000, "");
        assert!(!CycleView::at(&fresh, NOW).is_stale());

        let old = Observation::ended(WorldId::new(1), NOW - 167_000, "");
        assert!(CycleView::at(&old, NOW).is_stale());
    }

    #[test]
    fn seventy_seconds_after_end_is_optimal() {
        let obs = ended_ago(70);
        let view = CycleView::at(&obs, NOW);
        assert!(view.is_in_optimal_window());
        assert!(!view.is_approaching());
        assert_eq!(view.seconds_until_next_distraction(), Some(13));
        assert_eq!(view.band(), CycleBand::Optimal);
    }

    #[test]
    fn window_edges_are_inclusive() {
        assert!(CycleView::at(&ended_ago(68), NOW).is_in_optimal_window());
        assert!(CycleView::at(&ended_ago(83), NOW).is_in_optimal_window());
        assert!(!CycleView::at(&ended_ago(84), NOW).is_in_optimal_window());
        assert!(CycleView::at(&ended_ago(67), NOW).is_approaching());
        assert!(CycleView::at(&ended_ago(50), NOW).is_approaching());
        assert!(!CycleView::at(&ended_ago(49), NOW).is_approaching());
    }

    #[test]
    fn distracted_world_is_in_no_timing_band() {
        let obs = distracted_for(5);
        let view = CycleView::at(&obs, NOW);
        assert!(!view.is_in_optimal_window());
        assert!(!view.is_approaching());
        assert_eq!(view.seconds_since_distraction_ended(), None);
        assert_eq!(view.seconds_until_next_distraction(), Some(0));
        assert_eq!(view.distraction_duration_seconds(), 5);
        assert_eq!(view.band(), CycleBand::Distracted);
    }

    #[test]
    fn until_next_never_negative() {
        let view_obs = ended_ago(120);
        assert_eq!(
            CycleView::at(&view_obs, NOW).seconds_until_next_distraction(),
            Some(0)
        );
    }

    #[test]
    fn future_end_time_clamps_to_zero() {
        let obs = Observation::ended(WorldId::new(1), NOW + 5_000, "");
        let view = CycleView::at(&obs, NOW);
        assert_eq!(view.seconds_since_distraction_ended(), Some(0));
        assert_eq!(view.seconds_until_next_distraction(), Some(CYCLE_SECONDS));
    }

    #[test]
    fn exactly_one_band_holds() {
        for seconds in 0..=160 {
            let obs = ended_ago(seconds);
            let view = CycleView::at(&obs, NOW);
            let flags = [
                view.is_in_optimal_window(),
                view.is_approaching(),
                obs.is_distracted(),
            ];
            let held = flags.iter().filter(|flag| **flag).count();
            assert!(held <= 1, "more than one band at {seconds}s");
            if held == 0 {
                assert_eq!(view.band(), CycleBand::Other);
            }
        }
    }

    #[test]
    fn tiers_are_strictly_ordered() {
        let worst_optimal = (68..=83)
            .map(|s| CycleView::at(&ended_ago(s), NOW).priority())
            .max()
            .unwrap();
        let best_approaching = (50..68)
            .map(|s| CycleView::at(&ended_ago(s), NOW).priority())
            .min()
            .unwrap();
        let worst_approaching = (50..68)
            .map(|s| CycleView::at(&ended_ago(s), NOW).priority())
            .max()
            .unwrap();
        let best_distracted = (0..30)
            .map(|s| CycleView::at(&distracted_for(s), NOW).priority())
            .min()
            .unwrap();
        let best_other = (0..50)
            .chain(84..160)
            .map(|s| CycleView::at(&ended_ago(s), NOW).priority())
            .min()
            .unwrap();

        assert!(worst_optimal < best_approaching);
        assert!(worst_approaching < best_distracted);
        assert!(worst_approaching < best_other);

        let stale = Observation::new(WorldId::new(9), false, 0, NOW - 70_000, 0, "");
        let stale_score = CycleView::at(&stale, NOW).priority();
        assert!(stale_score > PriorityScore::NO_DATA);
        assert!(best_other < stale_score);
    }

    #[test]
    fn closer_to_next_distraction_sorts_first_within_tier() {
        let later = CycleView::at(&ended_ago(80), NOW).priority();
        let earlier = CycleView::at(&ended_ago(70), NOW).priority();
        assert!(later < earlier);

        let near = CycleView::at(&ended_ago(65), NOW).priority();
        let far = CycleView::at(&ended_ago(52), NOW).priority();
        assert!(near < far);

        let waiting_long = CycleView::at(&ended_ago(45), NOW).priority();
        let just_ended = CycleView::at(&ended_ago(3), NOW).priority();
        assert!(waiting_long < just_ended);
    }

    #[test]
    fn no_timing_data_sorts_before_stale() {
        let obs = Observation::new(WorldId::new(3), false, 0, 0, NOW - 1000, "");
        let view = CycleView::at(&obs, NOW);
        assert_eq!(view.priority(), PriorityScore::NO_DATA);
        assert!(view.priority() < PriorityScore::STALE);
    }
}
