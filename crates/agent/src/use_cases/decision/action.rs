use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use pokerbot_domain::{join_cards, ActionDecision, Card, HandState, PokerAction, TableId};

use super::json::extract_json;
use crate::infrastructure::correlation::DecisionId;
use crate::infrastructure::ports::{ChatMessage, LlmError, LlmPort, LlmRequest};

/// Everything an action decision is based on, captured when the turn is
/// detected. The decision never reads live session state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionContext {
    pub table_id: TableId,
    pub player_cards: Vec<Card>,
    pub middle_cards: Vec<Card>,
    pub current_status: String,
    pub highest_total_bet: f64,
}

impl ActionContext {
    pub fn snapshot(table_id: TableId, hand: &HandState) -> Self {
        Self {
            table_id,
            player_cards: hand.player_cards.clone(),
            middle_cards: hand.middle_cards.clone(),
            current_status: hand.current_status.clone(),
            highest_total_bet: hand.highest_total_bet,
        }
    }
}

/// Asks the oracle which poker action to take.
pub struct ActionDecisionClient {
    llm: Arc<dyn LlmPort>,
}

impl ActionDecisionClient {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    /// One oracle request; `None` on any failure.
    pub async fn decide(&self, id: DecisionId, context: &ActionContext) -> Option<ActionDecision> {
        let request = LlmRequest::new(vec![ChatMessage::user("What is your action?")])
            .with_system_prompt(build_system_prompt(context));

        tracing::debug!(
            decision_id = %id,
            table_id = %context.table_id,
            status = %context.current_status,
            "Requesting action decision"
        );

        let response = match self.llm.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(decision_id = %id, error = %e, "Action decision unavailable");
                return None;
            }
        };

        match parse_decision(&response.content) {
            Ok(decision) => {
                tracing::info!(
                    decision_id = %id,
                    table_id = %context.table_id,
                    action = %decision.action,
                    amount = ?decision.amount,
                    reason = %decision.reason,
                    "Oracle chose an action"
                );
                Some(decision)
            }
            Err(e) => {
                tracing::warn!(
                    decision_id = %id,
                    error = %e,
                    content = %response.content,
                    "Discarding unusable action decision"
                );
                None
            }
        }
    }
}

fn build_system_prompt(context: &ActionContext) -> String {
    let game_instruction = r#"You are playing at a Texas hold 'em table. Your task is to determine the next action to proceed. Your response should be a JSON object in the following format:
{
  "action": "RAISE" | "CALL" | "CHECK" | "FOLD",
  "amount": <number>, // Only for RAISE, otherwise null or omitted
  "reason": <string> // Small explanation of why this action was chosen
}"#;
    let cards = format!(
        "You have {} as hole cards, and the current middle cards are {}.",
        join_cards(&context.player_cards),
        join_cards(&context.middle_cards)
    );
    let status = format!(
        "The game's current status is {}. The highest total bet so far is {}.",
        context.current_status, context.highest_total_bet
    );
    let limitations =
        "You can only choose from these actions: RAISE, CALL, CHECK, or FOLD. Use FOLD only in rare cases.";

    format!("{game_instruction} {cards} {status} {limitations}")
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// Strictly parse oracle content into a decision.
///
/// `action` and a non-empty `reason` are required. `amount` is kept as given
/// (numbers or numeric strings); whether it is usable is decided when the
/// command is built.
pub fn parse_decision(content: &str) -> Result<ActionDecision, LlmError> {
    let raw: RawDecision = serde_json::from_str(extract_json(content))
        .map_err(|e| LlmError::InvalidResponse(format!("Invalid JSON in response: {e}")))?;

    let action = match raw.action.as_deref().map(|a| a.trim().to_ascii_uppercase()) {
        Some(word) => match word.as_str() {
            "RAISE" => PokerAction::Raise,
            "CALL" => PokerAction::Call,
            "CHECK" => PokerAction::Check,
            "FOLD" => PokerAction::Fold,
            other => {
                return Err(LlmError::InvalidResponse(format!("Unknown action '{other}'")));
            }
        },
        None => return Err(LlmError::InvalidResponse("Missing 'action' field".to_string())),
    };

    let reason = raw
        .reason
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("Missing 'reason' field".to_string()))?;

    let amount = match raw.amount {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(ActionDecision {
        action,
        amount,
        reason,
    })
}
