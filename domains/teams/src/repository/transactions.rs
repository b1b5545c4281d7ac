//! Transactional free functions for the teams domain
//!
//! Every workflow that can add a member starts with [`lock_team_tx`] so the
//! member count it reads stays current until commit.

use crate::domain::entities::{JoinRequestStatus, Team, TeamJoinRequest, TeamMember};
use crate::repository::join_requests::JOIN_REQUEST_COLUMNS;
use crate::repository::teams::TEAM_COLUMNS;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Load a team and hold its row lock until commit.
pub async fn lock_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> std::result::Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 FOR UPDATE"
    ))
    .bind(team_id)
    .fetch_optional(&mut **transaction)
    .await
}

/// Member rows of a team, leader excluded.
pub async fn count_members_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> std::result::Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
        .bind(team_id)
        .fetch_one(&mut **transaction)
        .await
}

pub async fn code_exists_tx(
    transaction: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    code: &str,
) -> std::result::Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE event_id = $1 AND code = $2)")
        .bind(event_id)
        .bind(code)
        .fetch_one(&mut **transaction)
        .await
}

pub async fn insert_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team: &Team,
) -> std::result::Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        r#"
        INSERT INTO teams (id, event_id, leader_id, name, max_members, code, visibility,
                           created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {TEAM_COLUMNS}
        "#
    ))
    .bind(team.id)
    .bind(team.event_id)
    .bind(team.leader_id)
    .bind(&team.name)
    .bind(team.max_members)
    .bind(&team.code)
    .bind(team.visibility)
    .bind(team.created_at)
    .bind(team.updated_at)
    .fetch_one(&mut **transaction)
    .await
}

pub async fn delete_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(team_id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Hand the team to another participation.
pub async fn set_leader_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    leader_id: Uuid,
) -> std::result::Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        r#"
        UPDATE teams SET leader_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {TEAM_COLUMNS}
        "#
    ))
    .bind(team_id)
    .bind(leader_id)
    .fetch_one(&mut **transaction)
    .await
}

pub async fn find_member_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    participation_id: Uuid,
) -> std::result::Result<Option<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT id, team_id, participation_id, joined_at
        FROM team_members
        WHERE team_id = $1 AND participation_id = $2
        "#,
    )
    .bind(team_id)
    .bind(participation_id)
    .fetch_optional(&mut **transaction)
    .await
}

pub async fn insert_member_tx(
    transaction: &mut Transaction<'_, Postgres>,
    member: &TeamMember,
) -> std::result::Result<TeamMember, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        r#"
        INSERT INTO team_members (id, team_id, participation_id, joined_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, team_id, participation_id, joined_at
        "#,
    )
    .bind(member.id)
    .bind(member.team_id)
    .bind(member.participation_id)
    .bind(member.joined_at)
    .fetch_one(&mut **transaction)
    .await
}

/// Remove a membership; false if the participation was not a member.
pub async fn delete_member_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    participation_id: Uuid,
) -> std::result::Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND participation_id = $2")
        .bind(team_id)
        .bind(participation_id)
        .execute(&mut **transaction)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_join_request_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    participation_id: Uuid,
) -> std::result::Result<Option<TeamJoinRequest>, sqlx::Error> {
    sqlx::query_as::<_, TeamJoinRequest>(&format!(
        r#"
        SELECT {JOIN_REQUEST_COLUMNS}
        FROM team_join_requests
        WHERE team_id = $1 AND participation_id = $2
        "#
    ))
    .bind(team_id)
    .bind(participation_id)
    .fetch_optional(&mut **transaction)
    .await
}

pub async fn lock_join_request_tx(
    transaction: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> std::result::Result<Option<TeamJoinRequest>, sqlx::Error> {
    sqlx::query_as::<_, TeamJoinRequest>(&format!(
        "SELECT {JOIN_REQUEST_COLUMNS} FROM team_join_requests WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **transaction)
    .await
}

pub async fn insert_join_request_tx(
    transaction: &mut Transaction<'_, Postgres>,
    request: &TeamJoinRequest,
) -> std::result::Result<TeamJoinRequest, sqlx::Error> {
    sqlx::query_as::<_, TeamJoinRequest>(&format!(
        r#"
        INSERT INTO team_join_requests (id, team_id, participation_id, full_name, email,
                                        phone, institution, message, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {JOIN_REQUEST_COLUMNS}
        "#
    ))
    .bind(request.id)
    .bind(request.team_id)
    .bind(request.participation_id)
    .bind(&request.profile.full_name)
    .bind(&request.profile.email)
    .bind(&request.profile.phone)
    .bind(&request.profile.institution)
    .bind(&request.message)
    .bind(request.status)
    .bind(request.created_at)
    .fetch_one(&mut **transaction)
    .await
}

pub async fn delete_join_request_tx(
    transaction: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM team_join_requests WHERE id = $1")
        .bind(id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Record a decision on a join request.
pub async fn update_join_request_status_tx(
    transaction: &mut Transaction<'_, Postgres>,
    request: &TeamJoinRequest,
) -> std::result::Result<TeamJoinRequest, sqlx::Error> {
    sqlx::query_as::<_, TeamJoinRequest>(&format!(
        r#"
        UPDATE team_join_requests SET status = $2, responded_at = $3
        WHERE id = $1
        RETURNING {JOIN_REQUEST_COLUMNS}
        "#
    ))
    .bind(request.id)
    .bind(request.status)
    .bind(request.responded_at)
    .fetch_one(&mut **transaction)
    .await
}

/// Drop a participation's pending requests, keeping `keep` if given.
///
/// Participations are per event, so this clears every other open request
/// the person has for the same event.
pub async fn delete_pending_requests_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participation_id: Uuid,
    keep: Option<Uuid>,
) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM team_join_requests
        WHERE participation_id = $1
          AND status = $2
          AND ($3::uuid IS NULL OR id <> $3)
        "#,
    )
    .bind(participation_id)
    .bind(JoinRequestStatus::Pending)
    .bind(keep)
    .execute(&mut **transaction)
    .await?;
    Ok(result.rows_affected())
}
