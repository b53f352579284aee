use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A playing card as reported by the server.
///
/// The server sends cards either as compact strings (`"AS"`) or as
/// `{ "value": "A", "suit": "Spades" }` objects. Both collapse to display text,
/// which is all the oracle prompts need.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Card(String);

impl Card {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CardRepr {
    Text(String),
    Parts { value: CardValue, suit: String },
}

// Card values come as "A"/"10" or bare numbers depending on server version.
#[derive(Deserialize)]
#[serde(untagged)]
enum CardValue {
    Text(String),
    Number(i64),
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardValue::Text(s) => f.write_str(s),
            CardValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match CardRepr::deserialize(deserializer)? {
            CardRepr::Text(text) => Card(text),
            CardRepr::Parts { value, suit } => Card(format!("{value} of {suit}")),
        })
    }
}

impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Join cards for prompt text, e.g. `"AS, KD"`.
pub fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
