//! Session lifecycle driven by inbound server events.

mod state_machine;

pub use state_machine::{AuthFailure, Effect, SessionConfig, SessionStateMachine};
