//! Follows the signal stream and logs the world board.

use std::sync::Arc;

use citizen_cycle_core::availability::AvailabilityWatch;
use citizen_cycle_core::board::{Board, BoardModel};
use citizen_cycle_core::cache::WorldMap;
use citizen_cycle_core::filter::WorldFilter;
use citizen_cycle_core::observer::{NotificationCue, Notifier};
use citizen_cycle_types::{CycleEvent, now_millis};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Notifier for a headless run: cues become log lines.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, cue: NotificationCue) {
        info!(?cue, "notification");
    }
}

/// Board state and availability announcements for the headless engine.
pub struct BoardMonitor {
    board: BoardModel,
    availability: AvailabilityWatch<LogNotifier>,
    filter: WorldFilter,
}

impl BoardMonitor {
    /// Create a monitor.
    pub fn new(
        filter: WorldFilter,
        availability: AvailabilityWatch<LogNotifier>,
    ) -> Self {
        Self {
            board: BoardModel::new(filter.clone()),
            availability,
            filter,
        }
    }

    /// Handle one signal. Returns the freshly rendered board after a
    /// refresh or a failed refresh.
    pub fn handle(&mut self, event: &CycleEvent, snapshot: &WorldMap, now_ms: i64) -> Option<Board> {
        self.board.apply(event);
        match event {
            CycleEvent::DataRefreshed(_) => {
                self.availability
                    .evaluate(snapshot, now_ms, None, &self.filter);
                Some(self.board.render(snapshot, now_ms))
            }
            CycleEvent::RefreshFailed(reason) => {
                warn!(%reason, "world data refresh failed");
                Some(self.board.render(snapshot, now_ms))
            }
            CycleEvent::WorldAvailable(world) => {
                info!(%world, "world ready to hop");
                None
            }
            _ => None,
        }
    }

    /// Consume signals until the bus closes, logging each board.
    pub async fn run<F>(mut self, mut rx: broadcast::Receiver<CycleEvent>, snapshot: F)
    where
        F: Fn() -> Arc<WorldMap> + Send,
    {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(board) = self.handle(&event, &snapshot(), now_millis()) {
                        info!("\n{board}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "board monitor lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
