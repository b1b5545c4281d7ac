//! Repository implementations for the events domain

pub mod events;
pub mod participations;
pub mod transactions;

use sqlx::{PgPool, Postgres, Transaction};

pub use events::EventRepository;
pub use participations::ParticipationRepository;
pub use transactions::{
    count_participations_for_user_tx, delete_participation_tx, delete_user_tx,
    detach_from_teams_tx, find_event_tx, find_team_link_tx, lock_participation_for_user_tx,
    lock_participation_tx, lock_team_member_participations_tx, lock_team_row_tx,
    save_payment_state_tx, set_status_tx, TeamLink,
};

/// Combined repository access for the events domain
#[derive(Clone)]
pub struct EventsRepositories {
    pool: PgPool,
    pub events: EventRepository,
    pub participations: ParticipationRepository,
}

impl EventsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participations: ParticipationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Get a reference to the underlying pool (for cross-domain transactions)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
