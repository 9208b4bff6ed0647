//! Per-second driver.
//!
//! The driver owns the elapsed-seconds counter and fans each new second
//! out to registered listeners. Listeners must return quickly: anything
//! slow (a network fetch) is spawned, never awaited on the driver.
//!
//! The counter starts at 1 on the first elapsed second and uses checked
//! arithmetic.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Errors the driver can hit.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The elapsed-seconds counter would overflow.
    #[error("elapsed-seconds counter overflow")]
    Overflow,
}

/// Something that runs once per elapsed second.
pub trait SecondListener: Send + Sync {
    /// Called with the number of seconds elapsed since the driver started.
    fn on_second(&self, second: u64);
}

/// Single logical per-second driver.
#[derive(Default)]
pub struct SecondDriver {
    elapsed: u64,
    listeners: Vec<Arc<dyn SecondListener>>,
}

impl SecondDriver {
    /// Create a driver with no listeners, at second 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn register(&mut self, listener: Arc<dyn SecondListener>) {
        self.listeners.push(listener);
    }

    /// Seconds elapsed so far.
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Advance by one second and notify every listener.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Overflow`] if the counter is exhausted.
    pub fn advance(&mut self) -> Result<u64, DriverError> {
        self.elapsed = self.elapsed.checked_add(1).ok_or(DriverError::Overflow)?;
        for listener in &self.listeners {
            listener.on_second(self.elapsed);
        }
        Ok(self.elapsed)
    }

    /// Drive the counter from a one-second timer until `shutdown` resolves.
    ///
    /// Missed ticks are skipped rather than replayed in a burst.
    pub async fn run<S>(mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    debug!(elapsed = self.elapsed, "second driver stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.advance() {
                        warn!(error = %e, "second driver halted");
                        break;
                    }
                }
            }
        }
    }
}

/// Resolve on `Ctrl-C`, or at once if the handler cannot be installed.
pub async fn ctrl_c() {
    signal_outcome(tokio::signal::ctrl_c().await);
}

/// Log how the wait for `Ctrl-C` ended and report whether the signal
/// was actually received.
fn signal_outcome(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!("shutdown signal received");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler, shutting down");
            false
        }
    }
}
