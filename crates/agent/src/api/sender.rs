//! Outbound table commands.

use tokio::sync::mpsc;

use pokerbot_domain::{ActionDecision, TableCommand, TableId};
use pokerbot_shared::ClientMessage;

/// Fire-and-forget writer onto the connection's outbound queue.
#[derive(Clone)]
pub struct ActionSender {
    outbound: mpsc::Sender<ClientMessage>,
}

impl ActionSender {
    pub fn new(outbound: mpsc::Sender<ClientMessage>) -> Self {
        Self { outbound }
    }

    /// Submit the command for a decision. `None` and unusable raises fold.
    pub fn submit(&self, table_id: TableId, decision: Option<&ActionDecision>) -> TableCommand {
        let command = TableCommand::from_decision(decision);
        if decision.is_none() {
            tracing::info!(%table_id, "No decision, folding");
        }
        self.send(command_message(table_id, command));
        command
    }

    pub fn chat(&self, message: String) {
        self.send(ClientMessage::ChatMessage { message });
    }

    /// Queue a message. A full or closed queue is logged and dropped.
    pub fn send(&self, message: ClientMessage) {
        let key = message.key();
        match self.outbound.try_send(message) {
            Ok(()) => tracing::debug!(key, "Queued outbound message"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(key, "Outbound queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(key, "Connection closed, dropping message");
            }
        }
    }
}

pub fn command_message(table_id: TableId, command: TableCommand) -> ClientMessage {
    match command {
        TableCommand::Fold => ClientMessage::SetFold { table_id },
        TableCommand::Check => ClientMessage::SetCheck { table_id },
        TableCommand::Raise(amount) => ClientMessage::SetRaise { table_id, amount },
    }
}
