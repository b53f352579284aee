//! Single dispatch loop for one session.
//!
//! Inbound server events are handled one at a time, in arrival order. Oracle
//! calls run on spawned tasks and report back through an internal completion
//! channel drained by the same loop, so the session, the in-flight markers and
//! outbound sends are only ever touched here.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use pokerbot_domain::{ActionDecision, TableId};
use pokerbot_shared::ServerMessage;

use super::sender::ActionSender;
use crate::infrastructure::correlation::DecisionId;
use crate::session::{AuthFailure, Effect, SessionStateMachine};
use crate::use_cases::decision::{ActionContext, ActionDecisionClient, ChatContext, ChatDecisionClient};

/// How a session run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    AuthFailed(AuthFailure),
    /// The server channel closed. No reconnection is attempted.
    ChannelClosed,
}

#[derive(Debug)]
enum Completion {
    Action {
        table_id: TableId,
        decision_id: DecisionId,
        decision: Option<ActionDecision>,
    },
    Chat {
        decision_id: DecisionId,
        reply: Option<String>,
    },
    TableSearchDue,
}

enum Event {
    Inbound(Option<ServerMessage>),
    Completion(Completion),
}

pub struct MessageDispatcher {
    machine: SessionStateMachine,
    action_client: Arc<ActionDecisionClient>,
    chat_client: Arc<ChatDecisionClient>,
    sender: ActionSender,
    /// Tables with an action decision outstanding.
    in_flight: HashSet<TableId>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    table_poll_interval: Option<Duration>,
    search_scheduled: bool,
    chat_enabled: bool,
}

impl MessageDispatcher {
    pub fn new(
        machine: SessionStateMachine,
        action_client: Arc<ActionDecisionClient>,
        chat_client: Arc<ChatDecisionClient>,
        sender: ActionSender,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            machine,
            action_client,
            chat_client,
            sender,
            in_flight: HashSet::new(),
            completions_tx,
            completions_rx,
            table_poll_interval: None,
            search_scheduled: false,
            chat_enabled: true,
        }
    }

    pub fn with_table_poll_interval(mut self, interval: Option<Duration>) -> Self {
        self.table_poll_interval = interval;
        self
    }

    pub fn with_chat_enabled(mut self, enabled: bool) -> Self {
        self.chat_enabled = enabled;
        self
    }

    pub fn machine(&self) -> &SessionStateMachine {
        &self.machine
    }

    /// Process events until authentication fails or the channel closes.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<ServerMessage>) -> SessionEnd {
        loop {
            // The completion sender lives in `self`, so that branch never ends.
            let event = tokio::select! {
                message = inbound.recv() => Event::Inbound(message),
                Some(completion) = self.completions_rx.recv() => Event::Completion(completion),
            };

            match event {
                Event::Inbound(Some(message)) => {
                    if let Some(end) = self.handle_inbound(message) {
                        return end;
                    }
                }
                Event::Inbound(None) => {
                    tracing::info!(
                        pending_decisions = self.in_flight.len(),
                        "Server channel closed, ending session"
                    );
                    return SessionEnd::ChannelClosed;
                }
                Event::Completion(completion) => self.handle_completion(completion),
            }
        }
    }

    /// Apply one inbound event. Returns the end of the session if it ended.
    pub fn handle_inbound(&mut self, message: ServerMessage) -> Option<SessionEnd> {
        tracing::debug!(key = message.key(), "Inbound message");
        let effects = self.machine.handle(message);
        self.apply(effects)
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Action {
                table_id,
                decision_id,
                decision,
            } => {
                self.in_flight.remove(&table_id);
                let command = self.sender.submit(table_id, decision.as_ref());
                tracing::info!(%decision_id, %table_id, ?command, "Submitted action");
            }
            Completion::Chat { decision_id, reply } => {
                if let Some(reply) = reply {
                    tracing::info!(%decision_id, reply = %reply, "Replying in chat");
                    self.sender.chat(reply);
                }
            }
            Completion::TableSearchDue => {
                self.search_scheduled = false;
                let effects = self.machine.table_search_due();
                // Only sends come out of a timed search.
                let _ = self.apply(effects);
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Option<SessionEnd> {
        for effect in effects {
            match effect {
                Effect::Send(message) => self.sender.send(message),
                Effect::RequestAction(context) => self.request_action(context),
                Effect::RequestChat(context) => self.request_chat(context),
                Effect::ScheduleTableSearch => self.schedule_table_search(),
                Effect::Terminate(reason) => return Some(SessionEnd::AuthFailed(reason)),
            }
        }
        None
    }

    fn request_action(&mut self, context: ActionContext) {
        let table_id = context.table_id;
        if !self.in_flight.insert(table_id) {
            tracing::debug!(%table_id, "Decision already in flight, dropping turn trigger");
            return;
        }

        let decision_id = DecisionId::new();
        let client = Arc::clone(&self.action_client);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let decision = client.decide(decision_id, &context).await;
            // Fails only once the dispatcher is gone; the result is moot then.
            let _ = completions.send(Completion::Action {
                table_id,
                decision_id,
                decision,
            });
        });
    }

    fn request_chat(&mut self, context: ChatContext) {
        if !self.chat_enabled {
            tracing::debug!(sender = %context.sender_name, "Chat disabled, not replying");
            return;
        }

        let decision_id = DecisionId::new();
        let client = Arc::clone(&self.chat_client);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let reply = client.reply(decision_id, &context).await;
            let _ = completions.send(Completion::Chat { decision_id, reply });
        });
    }

    fn schedule_table_search(&mut self) {
        let Some(interval) = self.table_poll_interval else {
            tracing::debug!("Table polling disabled");
            return;
        };
        if self.search_scheduled {
            return;
        }
        self.search_scheduled = true;

        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = completions.send(Completion::TableSearchDue);
        });
    }
}
