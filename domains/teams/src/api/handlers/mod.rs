//! HTTP handlers for the teams domain

pub mod join_requests;
pub mod teams;

use regdesk_common::{is_unique_violation, Error, Result};
use regdesk_events::{
    find_event_tx, lock_participation_for_user_tx, lock_participation_tx, set_status_tx, Event,
    Participation, ParticipationEvent, ParticipationGuardContext, ParticipationStatus,
    PaymentMode,
};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::api::middleware::TeamsState;
use crate::domain::entities::{Team, TeamMember};
use crate::repository::{delete_pending_requests_tx, insert_member_tx};

pub(crate) async fn load_team(state: &TeamsState, team_id: Uuid) -> Result<Team> {
    state
        .repos
        .teams
        .find(team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))
}

pub(crate) async fn load_event(state: &TeamsState, event_id: Uuid) -> Result<Event> {
    state
        .events
        .events
        .find(event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))
}

/// Event lookup for handlers already holding a transaction
pub(crate) async fn load_event_tx(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Event> {
    find_event_tx(tx, event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))
}

pub(crate) async fn begin(state: &TeamsState) -> Result<Transaction<'static, Postgres>> {
    state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))
}

pub(crate) async fn commit(tx: Transaction<'static, Postgres>) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))
}

/// Lock the caller's active participation for an event
pub(crate) async fn caller_participation_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    event_id: Uuid,
) -> Result<Participation> {
    let participation = lock_participation_for_user_tx(tx, user_id, event_id)
        .await?
        .ok_or_else(|| Error::NotFound("You are not registered for this event".to_string()))?;

    if !participation.is_active() {
        return Err(Error::Conflict(
            "Your registration for this event was cancelled".to_string(),
        ));
    }
    Ok(participation)
}

/// Reject callers who do not lead `team`
pub(crate) fn require_leader(team: &Team, caller: &Participation) -> Result<()> {
    if team.is_leader(caller.id) {
        Ok(())
    } else {
        Err(Error::Authorization(
            "Only the team leader can do this".to_string(),
        ))
    }
}

/// Add `participation` to a locked team whose capacity was already checked.
///
/// Clears the newcomer's other pending requests. In `team` payment mode a
/// newcomer joining a confirmed leader is confirmed too; the returned status
/// is `Some` when that happened.
pub(crate) async fn admit_member_tx(
    tx: &mut Transaction<'_, Postgres>,
    event: &Event,
    team: &Team,
    participation: &Participation,
    keep_request: Option<Uuid>,
) -> Result<(TeamMember, Option<ParticipationStatus>)> {
    let member = insert_member_tx(tx, &TeamMember::new(team.id, participation.id))
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some("team_members_participation_key")) {
                Error::Conflict("Already a member of a team for this event".to_string())
            } else {
                e.into()
            }
        })?;

    delete_pending_requests_tx(tx, participation.id, keep_request).await?;

    let mut covered = None;
    if event.payment_mode == PaymentMode::Team
        && participation.status != ParticipationStatus::Confirmed
    {
        let leader = lock_participation_tx(tx, team.leader_id)
            .await?
            .ok_or_else(|| Error::Internal("Team leader participation missing".to_string()))?;
        let guard = ParticipationGuardContext {
            leader_status: Some(leader.status),
        };
        if let Ok(next) = participation.next_status(ParticipationEvent::CoveredByTeam, Some(&guard))
        {
            set_status_tx(tx, participation.id, next).await?;
            covered = Some(next);
        }
    }

    Ok((member, covered))
}
