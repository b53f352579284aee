//! Pokerbot Shared - wire protocol for the game server channel.
//!
//! Both directions use the same `{ key, data }` JSON envelope.

pub mod error;
pub mod messages;

pub use error::ProtocolError;
pub use messages::{
    ChatLine, ChatMessageData, ClientMessage, ConnectedData, HoleCardsData, LoginData,
    PlayerCards, PlayerStatus, ServerMessage, StatusUpdateData, TablesData, UserParamsData,
};
