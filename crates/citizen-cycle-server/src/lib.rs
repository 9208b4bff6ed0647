//! Shared distraction feed service for Citizen Cycle.
//!
//! Reporters `POST` distraction edges for the world they are on; trackers
//! `GET` the whole feed every few seconds. The service derives the
//! start/end timestamps of each world's last distraction from consecutive
//! reports, so a reporter only ever sends "distracted now: yes/no".
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/citizens` | Every tracked world |
//! | `POST` | `/api/citizens` | Report a distraction edge |
//! | `GET` | `/api/citizens/{world}` | One world |
//! | `DELETE` | `/api/citizens/{world}` | Forget one world |
//! | `GET` | `/api/stats` | Distracted/not-distracted counts |
//! | `GET` | `/health` | Liveness and uptime |
//!
//! Records that have not been updated for a minute are swept every 30
//! seconds by a background task.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod sweeper;

pub use config::ServerConfig;
pub use router::build_router;
pub use server::{start_server, ServerError};
pub use state::AppState;
