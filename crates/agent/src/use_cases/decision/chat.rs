use std::sync::Arc;

use pokerbot_domain::{join_cards, Card, Game};

use crate::infrastructure::correlation::DecisionId;
use crate::infrastructure::ports::{ChatMessage, LlmPort, LlmRequest};

/// Literal the oracle answers with when a message needs no reply.
const NO_REPLY_SENTINEL: &str = "null";

/// Phase information for the selected table, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableContext {
    pub status: String,
    pub turn_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub game: Game,
    pub own_name: String,
    pub player_cards: Vec<Card>,
    pub middle_cards: Vec<Card>,
    pub sender_name: String,
    pub text: String,
    pub table: Option<TableContext>,
}

/// Asks the oracle for a reply to public table chat.
pub struct ChatDecisionClient {
    llm: Arc<dyn LlmPort>,
}

impl ChatDecisionClient {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    /// Reply text to send, or `None` when the oracle opts out or fails.
    pub async fn reply(&self, id: DecisionId, context: &ChatContext) -> Option<String> {
        let request = LlmRequest::new(vec![ChatMessage::user(context.text.clone())])
            .with_system_prompt(build_system_prompt(context));

        tracing::debug!(decision_id = %id, sender = %context.sender_name, "Requesting chat reply");

        match self.llm.generate(request).await {
            Ok(response) => {
                let reply = interpret_reply(&response.content);
                if reply.is_none() {
                    tracing::debug!(decision_id = %id, "Oracle declined to reply");
                }
                reply
            }
            Err(e) => {
                tracing::warn!(decision_id = %id, error = %e, "Chat reply unavailable");
                None
            }
        }
    }
}

fn build_system_prompt(context: &ChatContext) -> String {
    let mut prompt = format!(
        "You are a rude but humorous bot in a {} table and your name is {}. \
         You are part of public chat where user called {} sent a message. \
         You have {} cards and middle cards {} and you use this information for bluffing reasons.",
        context.game.display_name(),
        context.own_name,
        context.sender_name,
        join_cards(&context.player_cards),
        join_cards(&context.middle_cards),
    );

    if let Some(table) = &context.table {
        prompt.push_str(&format!(
            " The table status is {} and {}.",
            table.status, table.turn_text
        ));
    }

    prompt.push_str(" Keep answer under 40 characters.");
    prompt.push_str(" If the message does not need an answer, reply with just null.");
    prompt
}

/// Map raw oracle content to a reply. Empty content and the `null` sentinel
/// (optionally quoted, any case) mean no reply; anything else is kept as is.
pub fn interpret_reply(content: &str) -> Option<String> {
    let trimmed = content.trim();
    let unquoted = trimmed.trim_matches(|c| c == '"' || c == '\'').trim();
    if unquoted.is_empty() || unquoted.eq_ignore_ascii_case(NO_REPLY_SENTINEL) {
        return None;
    }
    Some(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{LlmError, LlmResponse, MockLlmPort};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the last request and answers with fixed content.
    struct RecordingLlm {
        content: String,
        last: Mutex<Option<LlmRequest>>,
    }

    #[async_trait]
    impl LlmPort for RecordingLlm {
        async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
            *self.last.lock().unwrap() = Some(request);
            Ok(LlmResponse {
                content: self.content.clone(),
                finish_reason: None,
            })
        }
    }

    fn context() -> ChatContext {
        ChatContext {
            game: Game::Holdem,
            own_name: "Bender".into(),
            player_cards: vec![Card::new("QH"), Card::new("QD")],
            middle_cards: vec![],
            sender_name: "alice".into(),
            text: "nice hand, robot".into(),
            table: Some(TableContext {
                status: "PRE_FLOP".into(),
                turn_text: "alice raised".into(),
            }),
        }
    }

    #[tokio::test]
    async fn forwards_reply_verbatim() {
        let llm = Arc::new(RecordingLlm {
            content: "Thanks, meatbag.".into(),
            last: Mutex::new(None),
        });
        let client = ChatDecisionClient::new(llm.clone());

        let reply = client.reply(DecisionId::new(), &context()).await;
        assert_eq!(reply.as_deref(), Some("Thanks, meatbag."));

        let request = llm.last.lock().unwrap().clone().unwrap();
        let system = request.system_prompt.unwrap();
        assert!(system.starts_with("You are a rude but humorous bot in a Texas hold 'em table and your name is Bender."));
        assert!(system.contains("user called alice sent a message"));
        assert!(system.contains("You have QH, QD cards"));
        assert!(system.contains("status is PRE_FLOP and alice raised"));
        assert!(system.contains("Keep answer under 40 characters."));
        assert_eq!(request.messages, vec![ChatMessage::user("nice hand, robot")]);
    }

    #[tokio::test]
    async fn null_sentinel_suppresses_reply() {
        let llm = Arc::new(RecordingLlm {
            content: "null".into(),
            last: Mutex::new(None),
        });
        let client = ChatDecisionClient::new(llm);
        assert_eq!(client.reply(DecisionId::new(), &context()).await, None);
    }

    #[tokio::test]
    async fn oracle_error_suppresses_reply() {
        let mut mock = MockLlmPort::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("timeout".into())));

        let client = ChatDecisionClient::new(Arc::new(mock));
        assert_eq!(client.reply(DecisionId::new(), &context()).await, None);
    }

    #[test]
    fn sentinel_variants() {
        assert_eq!(interpret_reply("null"), None);
        assert_eq!(interpret_reply("  NULL \n"), None);
        assert_eq!(interpret_reply("\"null\""), None);
        assert_eq!(interpret_reply(""), None);
        assert_eq!(interpret_reply("   "), None);
        assert_eq!(interpret_reply("nullify this"), Some("nullify this".into()));
        assert_eq!(interpret_reply("Not null"), Some("Not null".into()));
    }

    #[test]
    fn table_context_is_optional() {
        let mut ctx = context();
        ctx.table = None;
        ctx.game = Game::BottleSpin;
        let prompt = build_system_prompt(&ctx);
        assert!(prompt.starts_with("You are a rude but humorous bot in a  table"));
        assert!(!prompt.contains("table status"));
    }
}
