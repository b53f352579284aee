//! Session identity and lifecycle.
//!
//! A `Session` is owned by exactly one session state machine and mutated only
//! in response to inbound server events. The methods here enforce the ordering
//! invariants; deciding *which* event triggers them is the caller's job.

use std::fmt;

use crate::error::DomainError;
use crate::hand::HandState;
use crate::ids::{PlayerId, TableId};
use crate::table::Table;

/// Lifecycle of a session, in the order it normally progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
    ParamsConfirmed,
    TableSearching,
    TableSelected,
    Playing,
    /// Authentication failed; nothing else will happen in this session.
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Authenticated => "authenticated",
            SessionState::ParamsConfirmed => "params_confirmed",
            SessionState::TableSearching => "table_searching",
            SessionState::TableSelected => "table_selected",
            SessionState::Playing => "playing",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    player_id: Option<PlayerId>,
    player_name: Option<String>,
    auth_token: Option<String>,
    username: Option<String>,
    state: SessionState,
    selected_table: Option<Table>,
    hand: HandState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            player_id: None,
            player_name: None,
            auth_token: None,
            username: None,
            state: SessionState::Disconnected,
            selected_table: None,
            hand: HandState::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Username confirmed by the server's parameter response.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn selected_table_id(&self) -> Option<TableId> {
        self.selected_table.as_ref().map(|t| t.table_id)
    }

    pub fn hand(&self) -> &HandState {
        &self.hand
    }

    pub fn hand_mut(&mut self) -> &mut HandState {
        &mut self.hand
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Whether a table has been selected (selected or already playing).
    pub fn is_seated(&self) -> bool {
        matches!(self.state, SessionState::TableSelected | SessionState::Playing)
    }

    /// Whether `name` refers to this bot, by announced or confirmed name.
    pub fn is_self(&self, name: &str) -> bool {
        self.player_name.as_deref() == Some(name) || self.username.as_deref() == Some(name)
    }

    /// Server announced our identity.
    pub fn connect(&mut self, player_id: PlayerId, player_name: String) -> Result<(), DomainError> {
        self.require("connected", &[SessionState::Disconnected])?;
        self.player_id = Some(player_id);
        self.player_name = Some(player_name);
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Login succeeded with a token.
    pub fn authenticate(&mut self, token: String) -> Result<(), DomainError> {
        self.require("login", &[SessionState::Connected])?;
        if token.trim().is_empty() {
            return Err(DomainError::parse("login token is empty"));
        }
        self.auth_token = Some(token);
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// Server confirmed the user parameters.
    pub fn confirm_params(&mut self, username: Option<String>) -> Result<(), DomainError> {
        self.require("userParams", &[SessionState::Authenticated])?;
        if username.is_some() {
            self.username = username;
        }
        self.state = SessionState::ParamsConfirmed;
        Ok(())
    }

    pub fn begin_table_search(&mut self) -> Result<(), DomainError> {
        self.require(
            "getTables",
            &[SessionState::ParamsConfirmed, SessionState::TableSearching],
        )?;
        self.state = SessionState::TableSearching;
        Ok(())
    }

    /// Fix the session's table. Allowed once per session.
    pub fn select_table(&mut self, table: Table) -> Result<(), DomainError> {
        if self.selected_table.is_some() {
            return Err(DomainError::TableAlreadySelected);
        }
        self.require("selectTable", &[SessionState::TableSearching])?;
        self.selected_table = Some(table);
        self.hand = HandState::default();
        self.state = SessionState::TableSelected;
        Ok(())
    }

    /// First game event at the selected table.
    pub fn mark_playing(&mut self) {
        if self.state == SessionState::TableSelected {
            self.state = SessionState::Playing;
        }
    }

    pub fn terminate(&mut self) {
        self.auth_token = None;
        self.state = SessionState::Terminated;
    }

    fn require(&self, event: &'static str, allowed: &[SessionState]) -> Result<(), DomainError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(event, self.state))
        }
    }
}
