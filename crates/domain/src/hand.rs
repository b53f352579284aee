//! Hand state tracked while seated at a table.

use serde::{Deserialize, Serialize};

use crate::cards::Card;

/// What the bot knows about the current hand.
///
/// Each field is sourced from exactly one server event and replaced, never
/// merged: `player_cards` from hole cards, the rest from status updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandState {
    pub player_cards: Vec<Card>,
    pub middle_cards: Vec<Card>,
    pub current_status: String,
    pub current_turn_text: String,
    pub highest_total_bet: f64,
}

impl HandState {
    pub fn replace_player_cards(&mut self, cards: Vec<Card>) {
        self.player_cards = cards;
    }

    /// Replace the table-wide part of the hand from a status update.
    pub fn apply_status(
        &mut self,
        middle_cards: Vec<Card>,
        current_status: String,
        current_turn_text: String,
        total_bets: impl IntoIterator<Item = f64>,
    ) {
        self.middle_cards = middle_cards;
        self.current_status = current_status;
        self.current_turn_text = current_turn_text;
        self.highest_total_bet = highest_total_bet(total_bets);
    }
}

/// Maximum total bet across seated players, `0` when nobody has bet.
pub fn highest_total_bet(total_bets: impl IntoIterator<Item = f64>) -> f64 {
    total_bets
        .into_iter()
        .filter(|bet| bet.is_finite())
        .fold(0.0, f64::max)
}
