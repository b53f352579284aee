//! Tables offered by the game server and the rules for picking one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::TableId;

/// Game variant played at a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Game {
    Holdem,
    FiveCardDraw,
    BottleSpin,
    /// Forward-compatibility fallback for variants this client does not know.
    #[serde(other)]
    Unknown,
}

impl Game {
    /// Human-readable name used in oracle prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Game::Holdem => "Texas hold 'em",
            Game::FiveCardDraw => "Five-card draw",
            Game::BottleSpin | Game::Unknown => "",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Game::Holdem => write!(f, "HOLDEM"),
            Game::FiveCardDraw => write!(f, "FIVE_CARD_DRAW"),
            Game::BottleSpin => write!(f, "BOTTLE_SPIN"),
            Game::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl FromStr for Game {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "HOLDEM" => Ok(Game::Holdem),
            "FIVE_CARD_DRAW" => Ok(Game::FiveCardDraw),
            "BOTTLE_SPIN" => Ok(Game::BottleSpin),
            other => Err(DomainError::parse(format!("unknown game variant '{other}'"))),
        }
    }
}

/// Immutable snapshot of a table as described in a server listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_id: TableId,
    #[serde(default)]
    pub table_name: String,
    pub game: Game,
    #[serde(default)]
    pub min_bet: f64,
    #[serde(default)]
    pub player_count: u32,
    pub max_seats: u32,
    #[serde(default)]
    pub password_protected: bool,
}

impl Table {
    pub fn has_open_seat(&self) -> bool {
        self.player_count < self.max_seats
    }
}

/// Which table the session should try to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableTarget {
    /// A specific table, by id.
    Id(TableId),
    /// The first open, unprotected table of the configured game.
    Suitable,
}

/// Picks a table out of a listing.
///
/// Selection is a first-match scan in listing order; there is no ranking.
#[derive(Debug, Clone, Copy)]
pub struct TableSelector {
    game: Game,
}

impl TableSelector {
    pub fn new(game: Game) -> Self {
        Self { game }
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn select<'a>(&self, tables: &'a [Table], target: TableTarget) -> Option<&'a Table> {
        match target {
            TableTarget::Id(id) => self.by_id(tables, id),
            TableTarget::Suitable => self.by_suitability(tables),
        }
    }

    /// First table with the given id, the configured game and a free seat.
    pub fn by_id<'a>(&self, tables: &'a [Table], target: TableId) -> Option<&'a Table> {
        tables
            .iter()
            .find(|t| t.table_id == target && t.game == self.game && t.has_open_seat())
    }

    /// First table of the configured game that is open and not password protected.
    pub fn by_suitability<'a>(&self, tables: &'a [Table]) -> Option<&'a Table> {
        tables
            .iter()
            .find(|t| t.game == self.game && !t.password_protected && t.has_open_seat())
    }
}
