//! Scripted game server and oracle for end-to-end tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::infrastructure::config::AgentConfig;
use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

/// How long a test waits for any single frame.
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Game server
// =============================================================================

pub struct TestServer {
    listener: TcpListener,
    url: String,
}

impl TestServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        Self {
            listener,
            url: format!("ws://{addr}"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn accept(&self) -> ServerConnection {
        let (stream, _) = tokio::time::timeout(FRAME_TIMEOUT, self.listener.accept())
            .await
            .expect("bot connected in time")
            .expect("accept");
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");
        ServerConnection { ws }
    }
}

/// Server side of one bot connection.
pub struct ServerConnection {
    ws: WebSocketStream<TcpStream>,
}

impl ServerConnection {
    pub async fn send(&mut self, key: &str, data: Value) {
        let frame = json!({ "key": key, "data": data }).to_string();
        self.ws.send(Message::Text(frame)).await.expect("send frame");
    }

    pub async fn ping(&mut self, payload: &[u8]) {
        self.ws
            .send(Message::Ping(payload.to_vec()))
            .await
            .expect("send ping");
    }

    /// Next frame of any kind, `None` once the bot has gone away.
    pub async fn next_frame(&mut self) -> Option<Message> {
        match tokio::time::timeout(FRAME_TIMEOUT, self.ws.next()).await {
            Ok(Some(Ok(frame))) => Some(frame),
            Ok(_) => None,
            Err(_) => panic!("no frame from the bot within {FRAME_TIMEOUT:?}"),
        }
    }

    /// Next command from the bot, skipping keepalive frames.
    pub async fn next_command(&mut self) -> Option<(String, Value)> {
        loop {
            match self.next_frame().await? {
                Message::Text(text) => return Some(parse_command(&text)),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Assert the next command has `key`, returning its data.
    pub async fn expect_command(&mut self, key: &str) -> Value {
        let (got, data) = self
            .next_command()
            .await
            .unwrap_or_else(|| panic!("connection ended while waiting for {key}"));
        assert_eq!(got, key, "unexpected command with data {data}");
        data
    }

    /// Commands received within `window`.
    pub async fn commands_within(&mut self, window: Duration) -> Vec<(String, Value)> {
        let mut commands = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Some(Ok(frame))) = tokio::time::timeout_at(deadline, self.ws.next()).await {
            if let Message::Text(text) = frame {
                commands.push(parse_command(&text));
            }
        }
        commands
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        // Drain until the bot acknowledges.
        while let Ok(Some(Ok(_))) = tokio::time::timeout(FRAME_TIMEOUT, self.ws.next()).await {}
    }
}

fn parse_command(text: &str) -> (String, Value) {
    let value: Value = serde_json::from_str(text).expect("bot sent JSON");
    let key = value["key"].as_str().expect("envelope key").to_string();
    (key, value.get("data").cloned().unwrap_or(Value::Null))
}

pub fn table_json(id: i64, players: u32, protected: bool) -> Value {
    json!({
        "tableId": id,
        "tableName": format!("table-{id}"),
        "game": "HOLDEM",
        "minBet": 10,
        "playerCount": players,
        "maxSeats": 6,
        "passwordProtected": protected,
    })
}

pub fn status_json(our_turn: bool) -> Value {
    json!({
        "totalPot": 60,
        "currentStatus": "FLOP",
        "currentTurnText": "bot is thinking",
        "middleCards": ["2C", "7H", "9S"],
        "playersData": [
            { "playerId": 3, "playerName": "alice", "totalBet": 40, "isPlayerTurn": false },
            { "playerId": 7, "playerName": "bot", "totalBet": 20, "isPlayerTurn": our_turn },
        ],
    })
}

// =============================================================================
// Oracle
// =============================================================================

/// Answers action and chat prompts with fixed content.
///
/// Action requests can be held at a gate so a test controls when the
/// decision resolves.
pub struct ScriptedLlm {
    action_content: String,
    chat_content: String,
    gate: Option<Arc<Notify>>,
    action_calls: AtomicUsize,
    chat_calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(action_content: &str, chat_content: &str) -> Self {
        Self {
            action_content: action_content.to_string(),
            chat_content: chat_content.to_string(),
            gate: None,
            action_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn action_calls(&self) -> usize {
        self.action_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let is_action = request
            .system_prompt
            .as_deref()
            .is_some_and(|p| p.contains("JSON object"));

        let content = if is_action {
            self.action_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.action_content.clone()
        } else {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.chat_content.clone()
        };

        Ok(LlmResponse {
            content,
            finish_reason: Some("stop".into()),
        })
    }
}

// =============================================================================
// Config
// =============================================================================

pub fn agent_config(server_url: &str, extra: &[(&str, &str)]) -> AgentConfig {
    let mut vars: HashMap<String, String> = [
        ("POKER_SERVER_API_ADDRESS", server_url),
        ("POKER_USERNAME", "bot"),
        ("POKER_PASSWORD", "secret"),
        ("LLM_MODEL", "test-model"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    AgentConfig::from_lookup(move |name| vars.get(name).cloned()).expect("valid test config")
}
