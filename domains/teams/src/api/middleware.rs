//! Teams domain state and auth backend integration

use crate::TeamsRepositories;
use axum::extract::FromRef;
use regdesk_auth::AuthBackend;
use regdesk_email::EmailService;
use regdesk_events::EventsRepositories;
use std::sync::Arc;

/// Application state for the teams domain
#[derive(Clone)]
pub struct TeamsState {
    pub repos: TeamsRepositories,
    /// Events and participations, read and locked by team workflows
    pub events: EventsRepositories,
    pub auth: AuthBackend,
    pub email: Arc<dyn EmailService>,
}

impl FromRef<TeamsState> for AuthBackend {
    fn from_ref(state: &TeamsState) -> Self {
        state.auth.clone()
    }
}
