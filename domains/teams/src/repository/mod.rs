//! Repository implementations for the teams domain

pub mod join_requests;
pub mod teams;
pub mod transactions;

use sqlx::{PgPool, Postgres, Transaction};

pub use join_requests::JoinRequestRepository;
pub use teams::{map_team_write_error, TeamRepository};
pub use transactions::{
    code_exists_tx, count_members_tx, delete_join_request_tx, delete_member_tx,
    delete_pending_requests_tx, delete_team_tx, find_join_request_tx, find_member_tx,
    insert_join_request_tx, insert_member_tx, insert_team_tx, lock_join_request_tx,
    lock_team_tx, set_leader_tx, update_join_request_status_tx,
};

/// Combined repository access for the teams domain
#[derive(Clone)]
pub struct TeamsRepositories {
    pool: PgPool,
    pub teams: TeamRepository,
    pub join_requests: JoinRequestRepository,
}

impl TeamsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            teams: TeamRepository::new(pool.clone()),
            join_requests: JoinRequestRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
