//! Presentation view-model: the ranked world board.
//!
//! [`BoardModel`] follows the signal stream (to remember the last refresh
//! error) and renders a [`Board`] from a cache snapshot once per second.
//! Stale worlds are counted in the headline but never listed.

use core::fmt;

use citizen_cycle_types::{CycleEvent, Observation, WorldId};

use crate::cache::WorldMap;
use crate::cycle::{CycleBand, CycleView, PriorityScore};
use crate::filter::WorldFilter;

/// One listed world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    /// The world.
    pub world: WorldId,
    /// Timing band at render time.
    pub band: CycleBand,
    /// Sort key at render time.
    pub priority: PriorityScore,
    /// Short human-readable status.
    pub status: String,
    /// Whether the operator is on this world.
    pub is_current: bool,
    /// Whether a hop to this world is offered.
    pub hoppable: bool,
    /// Who reported the observation.
    pub reported_by: String,
}

/// A rendered board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Summary line.
    pub headline: String,
    /// Fresh worlds, best priority first.
    pub rows: Vec<BoardRow>,
    /// Last refresh error, if the most recent refresh failed.
    pub error: Option<String>,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline)?;
        if let Some(error) = &self.error {
            writeln!(f, "  ! {error}")?;
        }
        for row in &self.rows {
            let marker = if row.is_current { " (current)" } else { "" };
            writeln!(f, "  World {:<4} {}{marker}", row.world, row.status)?;
        }
        Ok(())
    }
}

/// Status line for one observation.
pub fn status_line(view: &CycleView<'_>) -> String {
    let until = view.seconds_until_next_distraction().unwrap_or(0);
    match view.band() {
        CycleBand::Distracted => {
            format!("DISTRACTED ({}s)", view.distraction_duration_seconds())
        }
        CycleBand::Optimal => format!("HOP NOW! ~{until}s"),
        CycleBand::Approaching => format!("Approaching (~{until}s)"),
        CycleBand::Other if view.seconds_since_distraction_ended().is_some() => {
            format!("Waiting (~{until}s)")
        }
        CycleBand::Other => "No timing data".to_owned(),
    }
}

/// Headline for a set of observations.
pub fn headline(observations: &[&Observation], now_ms: i64) -> String {
    let mut optimal = 0_usize;
    let mut approaching = 0_usize;
    for obs in observations {
        let view = CycleView::at(obs, now_ms);
        if view.is_stale() {
            continue;
        }
        match view.band() {
            CycleBand::Optimal => optimal = optimal.saturating_add(1),
            CycleBand::Approaching => approaching = approaching.saturating_add(1),
            CycleBand::Distracted | CycleBand::Other => {}
        }
    }

    if optimal > 0 {
        format!("{optimal} world(s) ready to hop!")
    } else if approaching > 0 {
        format!("{approaching} world(s) approaching")
    } else {
        format!("Tracking {} world(s)", observations.len())
    }
}

/// Stateful board renderer.
#[derive(Debug, Clone, Default)]
pub struct BoardModel {
    filter: WorldFilter,
    current_world: Option<WorldId>,
    error: Option<String>,
}

impl BoardModel {
    /// Create a board with the given hop filter.
    pub const fn new(filter: WorldFilter) -> Self {
        Self {
            filter,
            current_world: None,
            error: None,
        }
    }

    /// Record the world the operator is on.
    pub const fn set_current_world(&mut self, world: Option<WorldId>) {
        self.current_world = world;
    }

    /// The hop filter, for catalog updates.
    pub const fn filter_mut(&mut self) -> &mut WorldFilter {
        &mut self.filter
    }

    /// The last refresh error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Follow a signal. Failures set the error; fresh data clears it.
    pub fn apply(&mut self, event: &CycleEvent) {
        match event {
            CycleEvent::DataRefreshed(_) => self.error = None,
            CycleEvent::RefreshFailed(reason) => self.error = Some(reason.clone()),
            _ => {}
        }
    }

    /// Render the board for `snapshot` as of `now_ms`.
    pub fn render(&self, snapshot: &WorldMap, now_ms: i64) -> Board {
        let all: Vec<&Observation> = snapshot.values().collect();

        let mut rows: Vec<BoardRow> = all
            .iter()
            .map(|obs| CycleView::at(obs, now_ms))
            .filter(|view| !view.is_stale())
            .map(|view| {
                let obs = view.observation();
                let is_current = self.current_world == Some(obs.world());
                BoardRow {
                    world: obs.world(),
                    band: view.band(),
                    priority: view.priority(),
                    status: status_line(&view),
                    is_current,
                    hoppable: !is_current && self.filter.admits(obs.world()),
                    reported_by: obs.reported_by().to_owned(),
                }
            })
            .collect();
        rows.sort_by_key(|row| (row.priority, row.world));

        Board {
            headline: headline(&all, now_ms),
            rows,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn ended(world: u32, ago_s: i64) -> Observation {
        Observation::new(
            WorldId::new(world),
            false,
            0,
            NOW - ago_s * 1000,
            NOW - 1000,
            "reporter",
        )
    }

    fn distracted(world: u32, for_s: i64) -> Observation {
        Observation::new(
            WorldId::new(world),
            true,
            NOW - for_s * 1000,
            0,
            NOW - 1000,
            "reporter",
        )
    }

    fn map(observations: Vec<Observation>) -> WorldMap {
        observations.into_iter().map(|o| (o.world(), o)).collect()
    }

    #[test]
    fn status_lines_cover_every_band() {
        let cases = [
            (distracted(1, 12), "DISTRACTED (12s)"),
            (ended(2, 70), "HOP NOW! ~13s"),
            (ended(3, 60), "Approaching (~23s)"),
            (ended(4, 20), "Waiting (~63s)"),
            (ended(5, 120), "Waiting (~0s)"),
            (Observation::new(WorldId::new(6), false, 0, 0, NOW, ""), "No timing data"),
        ];
        for (obs, expected) in cases {
            assert_eq!(status_line(&CycleView::at(&obs, NOW)), expected);
        }
    }

    #[test]
    fn headline_prefers_ready_then_approaching() {
        let a = ended(1, 70);
        let b = ended(2, 60);
        let c = distracted(3, 5);
        assert_eq!(headline(&[&a, &b, &c], NOW), "1 world(s) ready to hop!");
        assert_eq!(headline(&[&b, &c], NOW), "1 world(s) approaching");
        assert_eq!(headline(&[&c], NOW), "Tracking 1 world(s)");
    }

    #[test]
    fn render_ranks_marks_current_and_hides_stale() {
        let stale = Observation::new(WorldId::new(9), false, 0, NOW - 70_000, 0, "");
        let snapshot = map(vec![distracted(302, 4), ended(330, 70), ended(420, 55), stale]);

        let mut board = BoardModel::new(WorldFilter::permissive());
        board.set_current_world(Some(WorldId::new(330)));
        let rendered = board.render(&snapshot, NOW);

        let order: Vec<u32> = rendered.rows.iter().map(|r| r.world.get()).collect();
        assert_eq!(order, vec![330, 420, 302]);
        let current = rendered.rows.first().unwrap();
        assert!(current.is_current);
        assert!(!current.hoppable);
        assert!(rendered.rows.iter().skip(1).all(|r| r.hoppable));
        assert_eq!(rendered.headline, "1 world(s) ready to hop!");
    }

    #[test]
    fn error_is_cleared_by_next_refresh() {
        let mut board = BoardModel::default();
        board.apply(&CycleEvent::RefreshFailed("HTTP 502".to_owned()));
        assert_eq!(board.error(), Some("HTTP 502"));
        assert_eq!(
            board.render(&WorldMap::new(), NOW).error.as_deref(),
            Some("HTTP 502")
        );

        board.apply(&CycleEvent::DataRefreshed(Vec::new()));
        assert_eq!(board.error(), None);
    }

    #[test]
    fn display_lists_rows() {
        let board = BoardModel::default().render(&map(vec![ended(330, 70)]), NOW);
        let text = board.to_string();
        assert!(text.starts_with("1 world(s) ready to hop!"));
        assert!(text.contains("World 330  HOP NOW! ~13s"));
    }
}
