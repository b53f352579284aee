//! Session driving: the dispatch loop and the outbound command writer.

pub mod dispatcher;
pub mod sender;

pub use dispatcher::{MessageDispatcher, SessionEnd};
pub use sender::ActionSender;
