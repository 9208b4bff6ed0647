//! Background removal of records nobody has refreshed recently.

use std::sync::Arc;
use std::time::Duration;

use citizen_cycle_types::now_millis;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::state::AppState;

/// Spawn a task that sweeps `state` every `interval`, removing records
/// older than `stale_after`. The task runs until aborted.
pub fn spawn_sweeper(
    state: Arc<AppState>,
    interval: Duration,
    stale_after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.sweep(now_millis(), stale_after).await;
            debug!(removed = removed.len(), "sweep finished");
        }
    })
}
