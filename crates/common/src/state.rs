//! Common state machine error types
//!
//! Shared by the participation and join request state machines.

use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot apply {event} from {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

impl From<StateError> for crate::Error {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InvalidTransition { .. } | StateError::TerminalState(_) => {
                crate::Error::Conflict(err.to_string())
            }
            StateError::GuardFailed(msg) => crate::Error::Conflict(msg),
        }
    }
}
