//! Join request repository

use crate::domain::entities::{JoinRequestStatus, JoinRequestWithTeam, TeamJoinRequest};
use regdesk_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const JOIN_REQUEST_COLUMNS: &str = r#"
    id, team_id, participation_id, full_name, email, phone, institution,
    message, status, responded_at, created_at
"#;

#[derive(Clone)]
pub struct JoinRequestRepository {
    pool: PgPool,
}

impl JoinRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<TeamJoinRequest>> {
        let request = sqlx::query_as::<_, TeamJoinRequest>(&format!(
            "SELECT {JOIN_REQUEST_COLUMNS} FROM team_join_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Requests a participation has sent, newest first
    pub async fn list_for_participation(
        &self,
        participation_id: Uuid,
    ) -> Result<Vec<JoinRequestWithTeam>> {
        let requests = sqlx::query_as::<_, JoinRequestWithTeam>(
            r#"
            SELECT r.id, r.team_id, r.participation_id, r.full_name, r.email, r.phone,
                   r.institution, r.message, r.status, r.responded_at, r.created_at,
                   t.name AS team_name
            FROM team_join_requests r
            INNER JOIN teams t ON t.id = r.team_id
            WHERE r.participation_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(participation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Requests sent to a team, oldest first
    pub async fn list_for_team(
        &self,
        team_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> Result<Vec<TeamJoinRequest>> {
        let requests = sqlx::query_as::<_, TeamJoinRequest>(&format!(
            r#"
            SELECT {JOIN_REQUEST_COLUMNS}
            FROM team_join_requests
            WHERE team_id = $1 AND ($2::join_request_status IS NULL OR status = $2)
            ORDER BY created_at ASC
            "#
        ))
        .bind(team_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Delete a request only while it is still pending; false otherwise
    pub async fn delete_pending(&self, id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM team_join_requests WHERE id = $1 AND status = 'PENDING'")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
