//! Events domain: events, participations, payment workflow

pub mod api;
pub mod domain;
pub mod repository;

pub use domain::entities::*;
pub use domain::state::{
    ParticipationEvent, ParticipationGuardContext, ParticipationStateMachine, StateError,
};
pub use repository::{
    count_participations_for_user_tx, delete_participation_tx, delete_user_tx,
    detach_from_teams_tx, find_event_tx, find_team_link_tx, lock_participation_for_user_tx,
    lock_participation_tx, lock_team_member_participations_tx, lock_team_row_tx,
    save_payment_state_tx, set_status_tx, EventRepository, EventsRepositories,
    ParticipationRepository, TeamLink,
};

pub use api::handlers::participations::ParticipationResponse;
pub use api::routes;
pub use api::EventsState;
