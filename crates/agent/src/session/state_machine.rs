//! Maps inbound server events onto the session and decides what happens next.
//!
//! The machine never performs I/O. Each event yields a list of [`Effect`]s
//! that the dispatcher carries out: outbound messages, oracle requests,
//! a delayed table search, or termination.

use pokerbot_domain::{Game, Session, SessionState, Table, TableId, TableSelector, TableTarget};
use pokerbot_shared::{
    ChatMessageData, ClientMessage, ConnectedData, HoleCardsData, LoginData, ServerMessage,
    StatusUpdateData, TablesData, UserParamsData,
};

use crate::use_cases::decision::{ActionContext, ChatContext, TableContext};

/// Account and table preferences for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    pub password: String,
    pub game: Game,
    pub target: TableTarget,
    pub table_password: Option<String>,
}

/// Why a session ended during authentication. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Login rejected by server")]
    LoginRejected,
    #[error("Login reported success without a token")]
    MissingToken,
    #[error("User parameters rejected by server")]
    ParamsRejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(ClientMessage),
    /// Our turn: ask the oracle what to do with this snapshot.
    RequestAction(ActionContext),
    RequestChat(ChatContext),
    /// Nothing suitable in the listing; ask again later.
    ScheduleTableSearch,
    Terminate(AuthFailure),
}

pub struct SessionStateMachine {
    session: Session,
    config: SessionConfig,
    selector: TableSelector,
    /// Listing received before the session could act on it.
    cached_listing: Option<Vec<Table>>,
}

impl SessionStateMachine {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(),
            selector: TableSelector::new(config.game),
            config,
            cached_listing: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle(&mut self, message: ServerMessage) -> Vec<Effect> {
        if self.session.is_terminated() {
            tracing::debug!(key = message.key(), "Session terminated, ignoring event");
            return Vec::new();
        }

        match message {
            ServerMessage::Connected(data) => self.on_connected(data),
            ServerMessage::Login(data) => self.on_login(data),
            ServerMessage::UserParams(data) => self.on_user_params(data),
            ServerMessage::GetTables(data) => self.on_tables(data),
            ServerMessage::HoleCards(data) => self.on_hole_cards(data),
            ServerMessage::StatusUpdate(data) => self.on_status_update(data),
            ServerMessage::ChatMessage(data) => self.on_chat(data),
        }
    }

    /// The poll timer fired. Only meaningful while still searching.
    pub fn table_search_due(&mut self) -> Vec<Effect> {
        if self.session.state() == SessionState::TableSearching {
            tracing::debug!("Requesting table listing again");
            vec![Effect::Send(ClientMessage::GetTables)]
        } else {
            Vec::new()
        }
    }

    fn on_connected(&mut self, data: ConnectedData) -> Vec<Effect> {
        if let Err(e) = self.session.connect(data.player_id, data.player_name) {
            tracing::warn!(error = %e, "Ignoring connected event");
            return Vec::new();
        }
        tracing::info!(
            player_id = %data.player_id,
            player_name = self.session.player_name().unwrap_or_default(),
            "Connected to game server"
        );

        vec![Effect::Send(ClientMessage::Login {
            username: self.config.username.clone(),
            password: self.config.password.clone(),
        })]
    }

    fn on_login(&mut self, data: LoginData) -> Vec<Effect> {
        if self.session.state() != SessionState::Connected {
            tracing::warn!(state = %self.session.state(), "Ignoring login response");
            return Vec::new();
        }
        if !data.success {
            return self.fail(AuthFailure::LoginRejected);
        }
        let Some(token) = data.token.filter(|t| !t.trim().is_empty()) else {
            return self.fail(AuthFailure::MissingToken);
        };
        if let Err(e) = self.session.authenticate(token.clone()) {
            tracing::warn!(error = %e, "Ignoring login response");
            return Vec::new();
        }
        tracing::info!(state = %self.session.state(), "Logged in");

        vec![Effect::Send(ClientMessage::UserParams { token })]
    }

    fn on_user_params(&mut self, data: UserParamsData) -> Vec<Effect> {
        if self.session.state() != SessionState::Authenticated {
            tracing::warn!(state = %self.session.state(), "Ignoring userParams response");
            return Vec::new();
        }
        if !data.success {
            return self.fail(AuthFailure::ParamsRejected);
        }
        if let Err(e) = self.session.confirm_params(data.username) {
            tracing::warn!(error = %e, "Ignoring userParams response");
            return Vec::new();
        }
        tracing::info!(
            username = self.session.username().unwrap_or_default(),
            "User parameters confirmed"
        );

        if let Some(tables) = self.cached_listing.take() {
            tracing::debug!(count = tables.len(), "Selecting from cached table listing");
            return self.search(&tables);
        }
        if let Err(e) = self.session.begin_table_search() {
            tracing::warn!(error = %e, "Cannot start table search");
            return Vec::new();
        }
        vec![Effect::Send(ClientMessage::GetTables)]
    }

    fn on_tables(&mut self, data: TablesData) -> Vec<Effect> {
        match self.session.state() {
            SessionState::Disconnected | SessionState::Connected | SessionState::Authenticated => {
                tracing::debug!(count = data.tables.len(), "Caching table listing until parameters are confirmed");
                self.cached_listing = Some(data.tables);
                Vec::new()
            }
            SessionState::ParamsConfirmed | SessionState::TableSearching => self.search(&data.tables),
            state => {
                tracing::debug!(%state, "Table already selected, ignoring listing");
                Vec::new()
            }
        }
    }

    fn search(&mut self, tables: &[Table]) -> Vec<Effect> {
        if let Err(e) = self.session.begin_table_search() {
            tracing::warn!(error = %e, "Cannot search tables");
            return Vec::new();
        }

        let Some(table) = self.selector.select(tables, self.config.target).cloned() else {
            tracing::info!(
                count = tables.len(),
                game = %self.selector.game(),
                "No suitable table in listing"
            );
            return vec![Effect::ScheduleTableSearch];
        };

        let table_id = table.table_id;
        let table_name = table.table_name.clone();
        if let Err(e) = self.session.select_table(table) {
            tracing::warn!(error = %e, "Cannot select table");
            return Vec::new();
        }
        tracing::info!(%table_id, table_name = %table_name, "Table selected");

        vec![Effect::Send(ClientMessage::SelectTable {
            table_id,
            password: self.config.table_password.clone(),
        })]
    }

    fn on_hole_cards(&mut self, data: HoleCardsData) -> Vec<Effect> {
        if !self.accepts_table_event("holeCards", data.table_id) {
            return Vec::new();
        }
        let Some(player_id) = self.session.player_id() else {
            return Vec::new();
        };

        // Not dealt in: no cards this hand.
        let cards = data
            .players
            .into_iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.cards)
            .unwrap_or_default();
        tracing::debug!(cards = cards.len(), "Received hole cards");
        self.session.hand_mut().replace_player_cards(cards);
        self.session.mark_playing();
        Vec::new()
    }

    fn on_status_update(&mut self, data: StatusUpdateData) -> Vec<Effect> {
        if !self.accepts_table_event("statusUpdate", data.table_id) {
            return Vec::new();
        }
        let Some(table_id) = self.session.selected_table_id() else {
            return Vec::new();
        };

        let our_turn = self
            .session
            .player_id()
            .is_some_and(|id| data.is_turn_of(id));

        let bets: Vec<f64> = data.players_data.iter().map(|p| p.total_bet).collect();
        self.session.hand_mut().apply_status(
            data.middle_cards,
            data.current_status,
            data.current_turn_text,
            bets,
        );
        self.session.mark_playing();

        if !our_turn {
            return Vec::new();
        }
        let hand = self.session.hand();
        tracing::debug!(
            %table_id,
            status = %hand.current_status,
            highest_total_bet = hand.highest_total_bet,
            "Our turn"
        );
        vec![Effect::RequestAction(ActionContext::snapshot(table_id, hand))]
    }

    fn on_chat(&mut self, data: ChatMessageData) -> Vec<Effect> {
        if !self.session.is_seated() {
            tracing::debug!(state = %self.session.state(), "Not seated, ignoring chat");
            return Vec::new();
        }
        let line = data.chat_message;
        if self.session.is_self(&line.player_name) {
            return Vec::new();
        }

        let hand = self.session.hand();
        let table = (!hand.current_status.is_empty() || !hand.current_turn_text.is_empty()).then(|| {
            TableContext {
                status: hand.current_status.clone(),
                turn_text: hand.current_turn_text.clone(),
            }
        });
        let own_name = self
            .session
            .player_name()
            .or(self.session.username())
            .unwrap_or(&self.config.username)
            .to_string();

        vec![Effect::RequestChat(ChatContext {
            game: self.config.game,
            own_name,
            player_cards: hand.player_cards.clone(),
            middle_cards: hand.middle_cards.clone(),
            sender_name: line.player_name,
            text: line.message,
            table,
        })]
    }

    /// Seated, and the event is for our table when it names one.
    fn accepts_table_event(&self, key: &'static str, table_id: Option<TableId>) -> bool {
        if !self.session.is_seated() {
            tracing::debug!(key, state = %self.session.state(), "No table selected, ignoring event");
            return false;
        }
        match (table_id, self.session.selected_table_id()) {
            (Some(event_table), Some(selected)) if event_table != selected => {
                tracing::debug!(key, %event_table, %selected, "Event for another table, ignoring");
                false
            }
            _ => true,
        }
    }

    fn fail(&mut self, reason: AuthFailure) -> Vec<Effect> {
        tracing::error!(error = %reason, "Authentication failed, terminating session");
        self.session.terminate();
        vec![Effect::Terminate(reason)]
    }
}
