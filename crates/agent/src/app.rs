//! Application composition: one session from connect to end.

use std::sync::Arc;

use crate::api::{ActionSender, MessageDispatcher, SessionEnd};
use crate::infrastructure::config::AgentConfig;
use crate::infrastructure::openai::OpenAiCompatClient;
use crate::infrastructure::ports::LlmPort;
use crate::infrastructure::websocket::{Connection, ConnectionError, ConnectionManager};
use crate::session::{SessionConfig, SessionStateMachine};
use crate::use_cases::decision::{ActionDecisionClient, ChatDecisionClient};

pub struct App {
    config: AgentConfig,
    llm: Arc<dyn LlmPort>,
}

impl App {
    /// Wire the configured oracle client.
    pub fn new(config: AgentConfig) -> Self {
        let llm = Arc::new(OpenAiCompatClient::with_timeout(
            &config.oracle.base_url,
            &config.oracle.model,
            config.oracle.timeout,
        ));
        Self::with_llm(config, llm)
    }

    pub fn with_llm(config: AgentConfig, llm: Arc<dyn LlmPort>) -> Self {
        Self { config, llm }
    }

    /// Connect, run the session until it ends, then tear the channel down.
    pub async fn run(&self) -> Result<SessionEnd, ConnectionError> {
        let manager = ConnectionManager::new(self.config.server_url.clone(), self.config.handshake);
        let Connection {
            inbound,
            outbound,
            handle,
        } = manager.open().await?;

        let machine = SessionStateMachine::new(SessionConfig {
            username: self.config.username.clone(),
            password: self.config.password.clone(),
            game: self.config.game,
            target: self.config.table_target,
            table_password: self.config.table_password.clone(),
        });
        let dispatcher = MessageDispatcher::new(
            machine,
            Arc::new(ActionDecisionClient::new(Arc::clone(&self.llm))),
            Arc::new(ChatDecisionClient::new(Arc::clone(&self.llm))),
            ActionSender::new(outbound),
        )
        .with_table_poll_interval(self.config.table_poll_interval)
        .with_chat_enabled(self.config.chat_enabled);

        let end = dispatcher.run(inbound).await;
        tracing::info!(end = ?end, "Session ended");
        handle.close().await;
        Ok(end)
    }
}
