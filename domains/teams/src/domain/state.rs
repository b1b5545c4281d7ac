//! Join request state machine
//!
//! ```text
//! PENDING ──Approve (team has capacity)──► APPROVED
//!         ──Reject───────────────────────► REJECTED
//! ```
//!
//! `APPROVED` and `REJECTED` are terminal.

pub use regdesk_common::StateError;

use crate::domain::entities::JoinRequestStatus;

/// Events that trigger join request transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRequestEvent {
    Approve,
    Reject,
}

impl std::fmt::Display for JoinRequestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Guard context for join request transitions
#[derive(Debug, Clone)]
pub struct JoinRequestGuardContext {
    /// Whether the team can take one more member right now
    pub has_capacity: bool,
}

/// Join request state machine
pub struct JoinRequestStateMachine;

impl JoinRequestStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: JoinRequestStatus,
        event: JoinRequestEvent,
        context: Option<&JoinRequestGuardContext>,
    ) -> Result<JoinRequestStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (JoinRequestStatus::Pending, JoinRequestEvent::Approve) => {
                // Guard: approval without a capacity check is never allowed
                if !context.is_some_and(|ctx| ctx.has_capacity) {
                    return Err(StateError::GuardFailed("Team is full".to_string()));
                }
                JoinRequestStatus::Approved
            }
            (JoinRequestStatus::Pending, JoinRequestEvent::Reject) => JoinRequestStatus::Rejected,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without applying it
    pub fn can_transition(
        current: JoinRequestStatus,
        event: JoinRequestEvent,
        context: Option<&JoinRequestGuardContext>,
    ) -> bool {
        Self::transition(current, event, context).is_ok()
    }
}
