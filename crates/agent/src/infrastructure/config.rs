//! Agent configuration, read from the environment.
//!
//! `.env.local` and `.env` are loaded first (see [`load_dotenv`]); variables
//! already set in the process environment take precedence.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use pokerbot_domain::{Game, TableId, TableTarget};
use url::Url;

use crate::infrastructure::openai::{DEFAULT_ORACLE_BASE_URL, DEFAULT_ORACLE_TIMEOUT};
use crate::infrastructure::websocket::HandshakeMode;

const DEFAULT_TABLE_POLL_SECS: u64 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

impl ConfigError {
    fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            message: message.into(),
        }
    }
}

/// Oracle endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Full `ws://` or `wss://` URL of the game server
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub game: Game,
    pub table_target: TableTarget,
    pub table_password: Option<String>,
    pub handshake: HandshakeMode,
    /// `None` disables re-requesting the listing after an empty selection
    pub table_poll_interval: Option<Duration>,
    pub chat_enabled: bool,
    pub oracle: OracleConfig,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let server_url = server_url(&required("POKER_SERVER_API_ADDRESS")?)?;

        let game = match get("POKER_GAME") {
            Some(raw) => Game::from_str(&raw)
                .map_err(|e| ConfigError::invalid("POKER_GAME", e.to_string()))?,
            None => Game::Holdem,
        };

        let table_target = match get("POKER_TABLE_ID") {
            Some(raw) => TableTarget::Id(
                raw.parse::<TableId>()
                    .map_err(|e| ConfigError::invalid("POKER_TABLE_ID", e.to_string()))?,
            ),
            None => TableTarget::Suitable,
        };

        let handshake = match get("POKER_HANDSHAKE") {
            Some(raw) => raw
                .parse::<HandshakeMode>()
                .map_err(|e| ConfigError::invalid("POKER_HANDSHAKE", e))?,
            None => HandshakeMode::AwaitIdentity,
        };

        let poll_secs = parse_or("POKER_TABLE_POLL_SECS", get("POKER_TABLE_POLL_SECS"), DEFAULT_TABLE_POLL_SECS)?;
        let chat_enabled = match get("POKER_CHAT_ENABLED") {
            Some(raw) => parse_bool("POKER_CHAT_ENABLED", &raw)?,
            None => true,
        };

        let oracle_base = get("JAN_AI_SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_ORACLE_BASE_URL.to_string());
        Url::parse(&oracle_base).map_err(|e| ConfigError::invalid("JAN_AI_SERVER_ADDRESS", e.to_string()))?;
        let timeout_secs = parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), DEFAULT_ORACLE_TIMEOUT.as_secs())?;

        Ok(Self {
            server_url,
            username: required("POKER_USERNAME")?,
            password: required("POKER_PASSWORD")?,
            game,
            table_target,
            table_password: get("POKER_TABLE_PASSWORD"),
            handshake,
            table_poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
            chat_enabled,
            oracle: OracleConfig {
                base_url: oracle_base,
                model: required("LLM_MODEL")?,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

/// Normalise the server address: a bare `host[:port][/path]` gets `wss://`.
fn server_url(raw: &str) -> Result<String, ConfigError> {
    let candidate = if raw.starts_with("ws://") || raw.starts_with("wss://") {
        raw.to_string()
    } else if raw.contains("://") {
        return Err(ConfigError::invalid(
            "POKER_SERVER_API_ADDRESS",
            "scheme must be ws:// or wss://",
        ));
    } else {
        format!("wss://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ConfigError::invalid("POKER_SERVER_API_ADDRESS", e.to_string()))?;
    if url.host_str().is_none() {
        return Err(ConfigError::invalid("POKER_SERVER_API_ADDRESS", "missing host"));
    }
    Ok(candidate)
}

fn parse_or(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid(name, format!("{v}: {e}"))),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(name, format!("expected a boolean, got '{other}'"))),
    }
}

/// Load `.env.local` then `.env` from the working directory, then from the
/// workspace root. Missing files are fine.
pub fn load_dotenv() {
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");

    for dir in [Path::new("."), workspace_root.as_path()] {
        // Prefer local overrides.
        for filename in [".env.local", ".env"] {
            let path = dir.join(filename);
            if path.exists() {
                let _ = dotenvy::from_path(path);
            }
        }
    }
}
