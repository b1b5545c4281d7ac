//! Transactional free functions for the events domain
//!
//! Each takes an open transaction so handlers can bundle several writes.
//! The team tables are owned by the teams domain; the few queries here that
//! touch them are the reads and cleanups a participation's own workflow needs.

use crate::domain::entities::{Event, Participation, ParticipationStatus};
use crate::repository::events::EVENT_COLUMNS;
use crate::repository::participations::PARTICIPATION_COLUMNS;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// A participation's place in a team, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamLink {
    Leader { team_id: Uuid, member_count: i64 },
    Member { team_id: Uuid, leader_id: Uuid },
}

impl TeamLink {
    pub fn team_id(&self) -> Uuid {
        match self {
            TeamLink::Leader { team_id, .. } | TeamLink::Member { team_id, .. } => *team_id,
        }
    }
}

/// Read an event on the transaction's own connection.
pub async fn find_event_tx(
    transaction: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> std::result::Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(event_id)
        .fetch_optional(&mut **transaction)
        .await
}

/// Load a participation and hold its row lock until commit.
pub async fn lock_participation_tx(
    transaction: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> std::result::Result<Option<Participation>, sqlx::Error> {
    sqlx::query_as::<_, Participation>(&format!(
        "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **transaction)
    .await
}

/// Lock the caller's participation for an event.
pub async fn lock_participation_for_user_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    event_id: Uuid,
) -> std::result::Result<Option<Participation>, sqlx::Error> {
    sqlx::query_as::<_, Participation>(&format!(
        "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE user_id = $1 AND event_id = $2 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(&mut **transaction)
    .await
}

/// Write status and payment metadata back after a state transition.
pub async fn save_payment_state_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participation: &Participation,
) -> std::result::Result<Participation, sqlx::Error> {
    sqlx::query_as::<_, Participation>(&format!(
        r#"
        UPDATE participations SET
            status = $2,
            amount = $3,
            transaction_id = $4,
            screenshot_key = $5,
            payment_submitted_at = $6,
            payment_verified_at = $7,
            verified_by = $8,
            rejection_reason = $9,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PARTICIPATION_COLUMNS}
        "#
    ))
    .bind(participation.id)
    .bind(participation.status)
    .bind(participation.amount)
    .bind(&participation.transaction_id)
    .bind(&participation.screenshot_key)
    .bind(participation.payment_submitted_at)
    .bind(participation.payment_verified_at)
    .bind(participation.verified_by)
    .bind(&participation.rejection_reason)
    .fetch_one(&mut **transaction)
    .await
}

/// Set only the status column.
pub async fn set_status_tx(
    transaction: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: ParticipationStatus,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("UPDATE participations SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

pub async fn delete_participation_tx(
    transaction: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM participations WHERE id = $1")
        .bind(id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

pub async fn count_participations_for_user_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> std::result::Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM participations WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut **transaction)
        .await
}

/// Delete a user account; participations cascade.
pub async fn delete_user_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Find whether a participation leads or belongs to a team.
pub async fn find_team_link_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participation_id: Uuid,
) -> std::result::Result<Option<TeamLink>, sqlx::Error> {
    let led: Option<(Uuid, i64)> = sqlx::query_as(
        r#"
        SELECT t.id, (SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id)
        FROM teams t
        WHERE t.leader_id = $1
        "#,
    )
    .bind(participation_id)
    .fetch_optional(&mut **transaction)
    .await?;

    if let Some((team_id, member_count)) = led {
        return Ok(Some(TeamLink::Leader {
            team_id,
            member_count,
        }));
    }

    let member: Option<(Uuid, Uuid)> = sqlx::query_as(
        r#"
        SELECT m.team_id, t.leader_id
        FROM team_members m
        INNER JOIN teams t ON t.id = m.team_id
        WHERE m.participation_id = $1
        "#,
    )
    .bind(participation_id)
    .fetch_optional(&mut **transaction)
    .await?;

    Ok(member.map(|(team_id, leader_id)| TeamLink::Member { team_id, leader_id }))
}

/// Lock a team row ahead of any participation row.
///
/// Team workflows take the team lock first; cancellation follows the same
/// order. Returns the id when the team still exists.
pub async fn lock_team_row_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> std::result::Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
        .bind(team_id)
        .fetch_optional(&mut **transaction)
        .await
}

/// Current members (leader excluded) of the team led by `leader_id`, locked.
pub async fn lock_team_member_participations_tx(
    transaction: &mut Transaction<'_, Postgres>,
    leader_id: Uuid,
) -> std::result::Result<Vec<Participation>, sqlx::Error> {
    sqlx::query_as::<_, Participation>(&format!(
        r#"
        SELECT {PARTICIPATION_COLUMNS}
        FROM participations
        WHERE id IN (
            SELECT m.participation_id
            FROM team_members m
            INNER JOIN teams t ON t.id = m.team_id
            WHERE t.leader_id = $1
        )
        ORDER BY created_at ASC
        FOR UPDATE
        "#
    ))
    .bind(leader_id)
    .fetch_all(&mut **transaction)
    .await
}

/// Drop a cancelled participation's team footprint: a memberless team it
/// leads, its membership, and its pending join requests.
pub async fn detach_from_teams_tx(
    transaction: &mut Transaction<'_, Postgres>,
    participation_id: Uuid,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM teams t
        WHERE t.leader_id = $1
          AND NOT EXISTS (SELECT 1 FROM team_members m WHERE m.team_id = t.id)
        "#,
    )
    .bind(participation_id)
    .execute(&mut **transaction)
    .await?;

    sqlx::query("DELETE FROM team_members WHERE participation_id = $1")
        .bind(participation_id)
        .execute(&mut **transaction)
        .await?;

    sqlx::query("DELETE FROM team_join_requests WHERE participation_id = $1 AND status = 'PENDING'")
        .bind(participation_id)
        .execute(&mut **transaction)
        .await?;

    Ok(())
}
