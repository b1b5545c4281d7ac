//! Teams domain: teams, team members, join requests, team workflows

pub mod api;
pub mod domain;
pub mod repository;

pub use domain::entities::*;
pub use domain::state::{
    JoinRequestEvent, JoinRequestGuardContext, JoinRequestStateMachine, StateError,
};
pub use domain::validation::{generate_team_code, normalize_team_code};
pub use repository::{JoinRequestRepository, TeamRepository, TeamsRepositories};

pub use api::routes;
pub use api::TeamsState;
