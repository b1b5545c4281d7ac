//! Participation status state machine
//!
//! Every status change of a participation goes through
//! [`ParticipationStateMachine::transition`]. Handlers never compare or
//! assign status values directly.
//!
//! ```text
//! REGISTERED ──Confirm──────────────► CONFIRMED
//! PENDING_PAYMENT ──SubmitPayment──► PAYMENT_SUBMITTED ──VerifyPayment──► CONFIRMED
//!                 ◄──RejectPayment──
//! REGISTERED | PENDING_PAYMENT | PAYMENT_SUBMITTED ──CoveredByTeam──► CONFIRMED
//! any non-terminal ──Cancel──► CANCELLED (terminal)
//! ```

pub use regdesk_common::StateError;

use crate::domain::entities::ParticipationStatus;

/// Events that trigger participation status transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationEvent {
    /// Participant uploads a payment proof (or replaces one before review)
    SubmitPayment,
    /// Administrator accepts the payment proof
    VerifyPayment,
    /// Administrator rejects the payment proof
    RejectPayment,
    /// Confirmation of a free registration
    Confirm,
    /// The team leader paid for the whole team
    CoveredByTeam,
    Cancel,
}

impl std::fmt::Display for ParticipationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubmitPayment => write!(f, "submit_payment"),
            Self::VerifyPayment => write!(f, "verify_payment"),
            Self::RejectPayment => write!(f, "reject_payment"),
            Self::Confirm => write!(f, "confirm"),
            Self::CoveredByTeam => write!(f, "covered_by_team"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// Guard context for participation transitions
#[derive(Debug, Clone, Default)]
pub struct ParticipationGuardContext {
    /// Status of the team leader's participation, when the participant is a team member
    pub leader_status: Option<ParticipationStatus>,
}

/// Participation state machine
pub struct ParticipationStateMachine;

impl ParticipationStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: ParticipationStatus,
        event: ParticipationEvent,
        context: Option<&ParticipationGuardContext>,
    ) -> Result<ParticipationStatus, StateError> {
        use ParticipationEvent as E;
        use ParticipationStatus as S;

        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (S::PendingPayment | S::PaymentSubmitted, E::SubmitPayment) => S::PaymentSubmitted,
            (S::PaymentSubmitted, E::VerifyPayment) => S::Confirmed,
            (S::PaymentSubmitted, E::RejectPayment) => S::PendingPayment,
            (S::Registered, E::Confirm) => S::Confirmed,
            (S::Registered | S::PendingPayment | S::PaymentSubmitted, E::CoveredByTeam) => {
                let leader_confirmed = context
                    .and_then(|ctx| ctx.leader_status)
                    .is_some_and(|status| status == S::Confirmed);
                if !leader_confirmed {
                    return Err(StateError::GuardFailed(
                        "Team leader's payment is not confirmed".to_string(),
                    ));
                }
                S::Confirmed
            }
            (_, E::Cancel) => S::Cancelled,
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
        current: ParticipationStatus,
        event: ParticipationEvent,
        context: Option<&ParticipationGuardContext>,
    ) -> bool {
        Self::transition(current, event, context).is_ok()
    }
}
