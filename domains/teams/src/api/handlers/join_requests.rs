//! Joining teams directly or through leader-approved requests

use axum::extract::{Path, Query, State};
use regdesk_auth::AuthUser;
use regdesk_common::{is_unique_violation, ActionResponse, Error, Result, ValidatedJson};
use regdesk_events::{find_team_link_tx, lock_participation_tx, ParticipationStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    admit_member_tx, begin, caller_participation_tx, commit, load_event_tx, load_team,
    require_leader,
};
use crate::api::middleware::TeamsState;
use crate::domain::entities::{
    JoinRequestStatus, JoinRequestWithTeam, Team, TeamJoinRequest, TeamMember,
};
use crate::domain::validation::{normalize_team_code, team_code_format};
use crate::repository::{
    count_members_tx, delete_join_request_tx, find_join_request_tx, insert_join_request_tx,
    lock_join_request_tx, lock_team_tx, update_join_request_status_tx,
};

/// Request body for asking to join a team
#[derive(Debug, Default, Deserialize, Validate)]
pub struct JoinRequestBody {
    /// Note for the team leader
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

/// Request body for asking to join a team by its code
#[derive(Debug, Deserialize, Validate)]
pub struct JoinByCodeRequest {
    #[validate(custom(function = "team_code_format"))]
    pub code: String,

    #[validate(length(max = 500))]
    pub message: Option<String>,
}

/// Leader's decision on a join request
#[derive(Debug, Deserialize, Validate)]
pub struct RespondToJoinRequest {
    pub approve: bool,
}

/// `?status=` filter for a team's join requests; pending when absent
#[derive(Debug, Default, Deserialize)]
pub struct JoinRequestFilter {
    pub status: Option<JoinRequestStatus>,
}

/// Result of a direct join
#[derive(Debug, Serialize)]
pub struct JoinTeamResponse {
    pub member: TeamMember,
    /// Set when the leader's payment also covers the new member
    pub covered_status: Option<ParticipationStatus>,
}

/// Join a public team directly
///
/// **POST /v1/teams/{team_id}/join**
///
/// Capacity is counted under the team row lock. A participant whose request
/// to this team was rejected cannot bypass the leader by joining directly.
pub async fn join_team(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<ActionResponse<JoinTeamResponse>> {
    let mut tx = begin(&state).await?;

    let team = lock_team_tx(&mut tx, team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    if !team.is_public() {
        return Err(Error::Authorization(
            "This team is private; ask the leader for its code".to_string(),
        ));
    }

    let event = load_event_tx(&mut tx, team.event_id).await?;
    let participation = caller_participation_tx(&mut tx, ctx.user_id(), team.event_id).await?;

    if find_team_link_tx(&mut tx, participation.id).await?.is_some() {
        return Err(Error::Conflict(
            "You are already in a team for this event".to_string(),
        ));
    }
    if let Some(request) = find_join_request_tx(&mut tx, team.id, participation.id).await? {
        if request.status == JoinRequestStatus::Rejected {
            return Err(Error::Conflict(
                "Your request to join this team was declined; contact the team leader"
                    .to_string(),
            ));
        }
    }
    if !team.has_capacity(count_members_tx(&mut tx, team.id).await?) {
        return Err(Error::Conflict("Team is full".to_string()));
    }

    let (member, covered_status) =
        admit_member_tx(&mut tx, &event, &team, &participation, None).await?;

    commit(tx).await?;

    tracing::info!(
        team_id = %team.id,
        participation_id = %participation.id,
        user_id = %ctx.user_id(),
        "Joined team"
    );

    Ok(ActionResponse::with_message(
        JoinTeamResponse {
            member,
            covered_status,
        },
        format!("Joined {}", team.name),
    )
    .created())
}

/// Shared body of both join request routes
async fn submit_join_request(
    state: &TeamsState,
    user_id: Uuid,
    team: Team,
    message: Option<String>,
) -> Result<TeamJoinRequest> {
    let mut tx = begin(state).await?;

    // Serializes against approvals and direct joins on the same team
    let team = lock_team_tx(&mut tx, team.id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    let requester = caller_participation_tx(&mut tx, user_id, team.event_id).await?;

    if find_team_link_tx(&mut tx, requester.id).await?.is_some() {
        return Err(Error::Conflict(
            "You are already in a team for this event".to_string(),
        ));
    }

    if let Some(existing) = find_join_request_tx(&mut tx, team.id, requester.id).await? {
        match existing.status {
            JoinRequestStatus::Pending => {
                return Err(Error::Conflict(
                    "You already asked to join this team".to_string(),
                ));
            }
            JoinRequestStatus::Rejected => {
                return Err(Error::Conflict(
                    "Your request to join this team was declined; contact the team leader"
                        .to_string(),
                ));
            }
            // Approved earlier, left since
            JoinRequestStatus::Approved => delete_join_request_tx(&mut tx, existing.id).await?,
        }
    }

    if !team.has_capacity(count_members_tx(&mut tx, team.id).await?) {
        return Err(Error::Conflict("Team is full".to_string()));
    }

    let request = TeamJoinRequest::new(&team, &requester, message)?;
    let created = insert_join_request_tx(&mut tx, &request)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some("team_join_requests_team_participation_key")) {
                Error::Conflict("You already asked to join this team".to_string())
            } else {
                e.into()
            }
        })?;

    commit(tx).await?;

    tracing::info!(
        team_id = %team.id,
        request_id = %created.id,
        user_id = %user_id,
        "Join request submitted"
    );

    match state.events.participations.find(team.leader_id).await {
        Ok(Some(leader)) => {
            if let Err(e) = state
                .email
                .send_join_request_received(
                    &leader.profile.email,
                    &team.name,
                    team.id,
                    &created.profile.full_name,
                    created.message.as_deref(),
                )
                .await
            {
                tracing::warn!(error = %e, team_id = %team.id, "Failed to notify team leader");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, team_id = %team.id, "Failed to load team leader"),
    }

    Ok(created)
}

/// Ask to join a public team
///
/// **POST /v1/teams/{team_id}/join-requests**
///
/// Private teams are reached through their code instead.
pub async fn request_to_join(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<JoinRequestBody>,
) -> Result<ActionResponse<TeamJoinRequest>> {
    let team = load_team(&state, team_id).await?;
    if !team.is_public() {
        return Err(Error::Authorization(
            "This team is private; ask the leader for its code".to_string(),
        ));
    }

    let request = submit_join_request(&state, ctx.user_id(), team, req.message).await?;

    Ok(ActionResponse::with_message(request, "Join request sent").created())
}

/// Ask to join the team holding `code`
///
/// **POST /v1/events/{event_id}/join-requests**
pub async fn request_to_join_by_code(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<JoinByCodeRequest>,
) -> Result<ActionResponse<TeamJoinRequest>> {
    let code = normalize_team_code(&req.code)
        .ok_or_else(|| Error::Validation("Invalid team code".to_string()))?;

    let team = state
        .repos
        .teams
        .find_by_code(event_id, &code)
        .await?
        .ok_or_else(|| Error::NotFound("No team with this code".to_string()))?;

    let request = submit_join_request(&state, ctx.user_id(), team, req.message).await?;

    Ok(ActionResponse::with_message(request, "Join request sent").created())
}

/// Withdraw a pending join request
///
/// **DELETE /v1/join-requests/{request_id}**
pub async fn cancel_join_request(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
) -> Result<ActionResponse<()>> {
    let request = state
        .repos
        .join_requests
        .find(request_id)
        .await?
        .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;

    let requester = state
        .events
        .participations
        .find(request.participation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;
    if requester.user_id != ctx.user_id() {
        return Err(Error::Authorization(
            "Only the requester can withdraw a join request".to_string(),
        ));
    }

    if !request.is_pending() || !state.repos.join_requests.delete_pending(request.id).await? {
        return Err(Error::Conflict(
            "Only pending requests can be withdrawn".to_string(),
        ));
    }

    tracing::info!(request_id = %request.id, user_id = %ctx.user_id(), "Join request withdrawn");

    Ok(ActionResponse::message("Join request withdrawn"))
}

/// **GET /v1/events/{event_id}/join-requests/mine**
pub async fn list_my_join_requests(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(event_id): Path<Uuid>,
) -> Result<ActionResponse<Vec<JoinRequestWithTeam>>> {
    let Some(participation) = state
        .events
        .participations
        .find_by_user_and_event(ctx.user_id(), event_id)
        .await?
    else {
        return Ok(ActionResponse::ok(Vec::new()));
    };

    let requests = state
        .repos
        .join_requests
        .list_for_participation(participation.id)
        .await?;

    Ok(ActionResponse::ok(requests))
}

/// Join requests sent to a team
///
/// **GET /v1/teams/{team_id}/join-requests?status=**
pub async fn list_team_join_requests(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Query(filter): Query<JoinRequestFilter>,
) -> Result<ActionResponse<Vec<TeamJoinRequest>>> {
    let team = load_team(&state, team_id).await?;
    let caller = state
        .events
        .participations
        .find_by_user_and_event(ctx.user_id(), team.event_id)
        .await?
        .ok_or_else(|| Error::Authorization("Only the team leader can do this".to_string()))?;
    require_leader(&team, &caller)?;

    let requests = state
        .repos
        .join_requests
        .list_for_team(
            team.id,
            Some(filter.status.unwrap_or(JoinRequestStatus::Pending)),
        )
        .await?;

    Ok(ActionResponse::ok(requests))
}

/// Approve or reject a join request
///
/// **POST /v1/join-requests/{request_id}/respond**
///
/// Approval re-checks capacity and the requester's team status under the
/// team lock, adds the member, and clears the requester's other pending
/// requests for the event.
pub async fn respond_to_join_request(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RespondToJoinRequest>,
) -> Result<ActionResponse<TeamJoinRequest>> {
    let request = state
        .repos
        .join_requests
        .find(request_id)
        .await?
        .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;

    let mut tx = begin(&state).await?;

    let team = lock_team_tx(&mut tx, request.team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    let caller = caller_participation_tx(&mut tx, ctx.user_id(), team.event_id).await?;
    require_leader(&team, &caller)?;

    let mut request = lock_join_request_tx(&mut tx, request_id)
        .await?
        .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;
    if !request.is_pending() {
        return Err(Error::Conflict(format!(
            "Join request was already decided ({})",
            request.status
        )));
    }

    if req.approve {
        let requester = lock_participation_tx(&mut tx, request.participation_id)
            .await?
            .ok_or_else(|| Error::NotFound("Requester is no longer registered".to_string()))?;
        if !requester.is_active() {
            return Err(Error::Conflict(
                "Requester's registration was cancelled".to_string(),
            ));
        }
        if find_team_link_tx(&mut tx, requester.id).await?.is_some() {
            return Err(Error::Conflict(
                "Requester already joined a team for this event".to_string(),
            ));
        }

        let member_count = count_members_tx(&mut tx, team.id).await?;
        request.approve(&team, member_count)?;

        let event = load_event_tx(&mut tx, team.event_id).await?;
        admit_member_tx(&mut tx, &event, &team, &requester, Some(request.id)).await?;
    } else {
        request.reject()?;
    }

    let decided = update_join_request_status_tx(&mut tx, &request).await?;
    commit(tx).await?;

    let approved = decided.status == JoinRequestStatus::Approved;
    tracing::info!(
        team_id = %team.id,
        request_id = %decided.id,
        approved = approved,
        leader_user_id = %ctx.user_id(),
        "Join request decided"
    );

    if let Err(e) = state
        .email
        .send_join_request_decided(
            &decided.profile.email,
            &decided.profile.full_name,
            &team.name,
            team.id,
            approved,
        )
        .await
    {
        tracing::warn!(error = %e, request_id = %decided.id, "Failed to notify requester");
    }

    let message = if approved {
        "Join request approved"
    } else {
        "Join request rejected"
    };
    Ok(ActionResponse::with_message(decided, message))
}
