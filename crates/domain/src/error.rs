//! Unified error type for the domain layer

use thiserror::Error;

use crate::session::SessionState;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Parse error (for value objects read from configuration)
    #[error("Parse error: {0}")]
    Parse(String),

    /// State transition not allowed from the current session state
    #[error("Invalid state transition: {event} while {state}")]
    InvalidStateTransition {
        event: &'static str,
        state: SessionState,
    },

    /// The selected table is fixed for the life of a session
    #[error("A table is already selected for this session")]
    TableAlreadySelected,
}

impl DomainError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_transition(event: &'static str, state: SessionState) -> Self {
        Self::InvalidStateTransition { event, state }
    }
}
