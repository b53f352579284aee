//! Pokerbot domain types.
//!
//! Everything here is plain data plus the invariants that govern it. No I/O,
//! no async runtime.

pub mod cards;
pub mod decision;
pub mod error;
pub mod hand;
pub mod ids;
pub mod session;
pub mod table;

pub use cards::{join_cards, Card};
pub use decision::{ActionDecision, PokerAction, TableCommand};
pub use error::DomainError;
pub use hand::{highest_total_bet, HandState};
pub use ids::{PlayerId, TableId};
pub use session::{Session, SessionState};
pub use table::{Game, Table, TableSelector, TableTarget};
