//! Message types exchanged with the game server.
//!
//! Every frame is a JSON envelope `{ "key": <string>, "data": <object> }`.
//! `ClientMessage` is what the bot sends; `ServerMessage` is what it handles.
//!
//! ## Compatibility
//!
//! - Unknown keys decode to `ProtocolError::UnknownKey` and are skipped by callers
//! - Unknown fields inside `data` are ignored
//! - Optional fields default rather than fail, so older servers still decode

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pokerbot_domain::{Card, PlayerId, Table, TableId};

use crate::error::ProtocolError;

// =============================================================================
// Client Messages (Bot → Server)
// =============================================================================

/// Commands the bot sends to the game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "key",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Ask for the table listing
    GetTables,
    Login {
        username: String,
        password: String,
    },
    /// Confirm user parameters with the token obtained from login
    UserParams {
        token: String,
    },
    SelectTable {
        table_id: TableId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    SetFold {
        table_id: TableId,
    },
    /// Check, or call when there is a bet to match
    SetCheck {
        table_id: TableId,
    },
    SetRaise {
        table_id: TableId,
        amount: u64,
    },
    /// Public table chat
    ChatMessage {
        message: String,
    },
}

impl ClientMessage {
    pub fn key(&self) -> &'static str {
        match self {
            ClientMessage::GetTables => "getTables",
            ClientMessage::Login { .. } => "login",
            ClientMessage::UserParams { .. } => "userParams",
            ClientMessage::SelectTable { .. } => "selectTable",
            ClientMessage::SetFold { .. } => "setFold",
            ClientMessage::SetCheck { .. } => "setCheck",
            ClientMessage::SetRaise { .. } => "setRaise",
            ClientMessage::ChatMessage { .. } => "chatMessage",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

// =============================================================================
// Server Messages (Server → Bot)
// =============================================================================

/// Events from the game server that the bot acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Connected(ConnectedData),
    Login(LoginData),
    UserParams(UserParamsData),
    GetTables(TablesData),
    HoleCards(HoleCardsData),
    StatusUpdate(StatusUpdateData),
    ChatMessage(ChatMessageData),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    key: String,
    #[serde(default)]
    data: Value,
}

impl ServerMessage {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        tracing::trace!(key = %envelope.key, "Decoding server frame");

        let Envelope { key, data } = envelope;
        let message = match key.as_str() {
            "connected" => ServerMessage::Connected(payload(&key, data)?),
            "login" => ServerMessage::Login(payload(&key, data)?),
            "userParams" => ServerMessage::UserParams(payload(&key, data)?),
            "getTables" => ServerMessage::GetTables(payload(&key, data)?),
            "holeCards" => ServerMessage::HoleCards(payload(&key, data)?),
            "statusUpdate" => ServerMessage::StatusUpdate(payload(&key, data)?),
            "chatMessage" => ServerMessage::ChatMessage(payload(&key, data)?),
            _ => return Err(ProtocolError::UnknownKey(key)),
        };
        Ok(message)
    }

    pub fn key(&self) -> &'static str {
        match self {
            ServerMessage::Connected(_) => "connected",
            ServerMessage::Login(_) => "login",
            ServerMessage::UserParams(_) => "userParams",
            ServerMessage::GetTables(_) => "getTables",
            ServerMessage::HoleCards(_) => "holeCards",
            ServerMessage::StatusUpdate(_) => "statusUpdate",
            ServerMessage::ChatMessage(_) => "chatMessage",
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(key: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::InvalidPayload {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedData {
    pub player_id: PlayerId,
    #[serde(default)]
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserParamsData {
    pub success: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesData {
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleCardsData {
    /// Present on servers that scope events per table
    #[serde(default)]
    pub table_id: Option<TableId>,
    #[serde(default)]
    pub players: Vec<PlayerCards>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCards {
    pub player_id: PlayerId,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateData {
    #[serde(default)]
    pub table_id: Option<TableId>,
    #[serde(default)]
    pub total_pot: f64,
    #[serde(default)]
    pub current_status: String,
    #[serde(default)]
    pub current_turn_text: String,
    #[serde(default)]
    pub middle_cards: Vec<Card>,
    #[serde(default)]
    pub players_data: Vec<PlayerStatus>,
}

impl StatusUpdateData {
    /// Whether the given player is marked as the one to act.
    pub fn is_turn_of(&self, player_id: PlayerId) -> bool {
        self.players_data
            .iter()
            .any(|p| p.player_id == player_id && p.is_player_turn)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub player_id: PlayerId,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub total_bet: f64,
    #[serde(default)]
    pub is_player_turn: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageData {
    pub chat_message: ChatLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub player_name: String,
    pub message: String,
}
