//! Pokerbot agent library.
//!
//! ## Structure
//!
//! - `session/` - session state machine over inbound server events
//! - `use_cases/` - oracle-backed action and chat decisions
//! - `infrastructure/` - oracle client, game server channel, configuration
//! - `api/` - dispatch loop and outbound command writer
//! - `app` - composition of one session

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod session;
pub mod use_cases;

/// End-to-end tests against an in-process game server.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
