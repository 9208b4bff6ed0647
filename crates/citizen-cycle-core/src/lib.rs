//! Core logic for Citizen Cycle: the distraction-cycle tracker.
//!
//! A distraction recurs on a fixed period on every world of a shared
//! environment. Reporters post distraction edges to a shared feed; this
//! crate turns the feed into a ranked view of where to hop next and
//! drives the hop itself.
//!
//! # Modules
//!
//! - [`cycle`]: pure timing model and priority score for one world
//! - [`parse`]: tolerant decoding of the feed body
//! - [`cache`]: the shared world cache and its refresh cycle
//! - [`driver`]: the per-second driver
//! - [`observer`]: local edge detection, broadcast, and notification
//! - [`hop`]: bounded multi-step hop state machine
//! - [`board`]: ranked board view-model
//! - [`availability`]: optimal-window announcements
//! - [`filter`]: world-type and level filter
//! - [`bus`]: signal fan-out
//! - [`feed`]: the fetch/post collaborator seam
//! - [`config`]: YAML configuration

pub mod availability;
pub mod board;
pub mod bus;
pub mod cache;
pub mod config;
pub mod cycle;
pub mod driver;
pub mod feed;
pub mod filter;
pub mod hop;
pub mod observer;
pub mod parse;
