//! End-to-end session tests.
//!
//! Each test runs the full `App` (ConnectionManager, dispatcher, decision
//! clients) against an in-process WebSocket server that plays a scripted
//! game server, with a scripted oracle in place of the HTTP client.
//!
//! ```bash
//! cargo test -p pokerbot-agent --lib e2e_tests
//! ```

mod e2e_helpers;
mod session_flow_tests;

pub use e2e_helpers::*;
