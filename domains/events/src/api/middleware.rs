//! Events domain state and auth backend integration

use crate::EventsRepositories;
use axum::extract::FromRef;
use regdesk_auth::AuthBackend;
use regdesk_common::StorageConfig;
use regdesk_email::EmailService;
use std::sync::Arc;

/// Application state for the events domain
#[derive(Clone)]
pub struct EventsState {
    pub repos: EventsRepositories,
    pub auth: AuthBackend,
    pub email: Arc<dyn EmailService>,
    pub storage: StorageConfig,
}

impl FromRef<EventsState> for AuthBackend {
    fn from_ref(state: &EventsState) -> Self {
        state.auth.clone()
    }
}
