//! Team lifecycle handlers
//!
//! Creation, roster views, settings, and the leader-side membership
//! operations (leave, transfer, remove, delete). Anything that changes who
//! is on a team runs under the team row lock.

use axum::extract::{Path, State};
use regdesk_auth::AuthUser;
use regdesk_common::{ActionResponse, Error, Result, ValidatedJson};
use regdesk_events::{
    count_participations_for_user_tx, delete_participation_tx, delete_user_tx,
    find_team_link_tx, lock_participation_tx,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{begin, caller_participation_tx, commit, load_event, load_team, require_leader};
use crate::api::middleware::TeamsState;
use crate::domain::entities::{
    PublicTeam, RosterEntry, Team, TeamMember, TeamRole, TeamVisibility,
};
use crate::domain::validation::{generate_team_code, team_code_format, team_name_format};
use crate::repository::{
    code_exists_tx, count_members_tx, delete_member_tx, delete_pending_requests_tx,
    delete_team_tx, find_member_tx, insert_member_tx, insert_team_tx, lock_team_tx,
    map_team_write_error, set_leader_tx,
};

/// Attempts at drawing an unused generated code
const CODE_GENERATION_ATTEMPTS: usize = 5;

/// Request for creating a team
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(custom(function = "team_name_format"))]
    pub name: String,

    /// Custom join code; one is generated when absent
    #[validate(custom(function = "team_code_format"))]
    pub code: Option<String>,

    #[serde(default)]
    pub visibility: TeamVisibility,
}

/// Request for updating team settings
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(custom(function = "team_name_format"))]
    pub name: Option<String>,

    pub visibility: Option<TeamVisibility>,

    #[validate(custom(function = "team_code_format"))]
    pub code: Option<String>,

    /// Replace the code with a freshly generated one
    #[serde(default)]
    pub regenerate_code: bool,
}

/// Request for handing leadership to a member
#[derive(Debug, Deserialize, Validate)]
pub struct TransferLeadershipRequest {
    pub participation_id: Uuid,
}

/// Public listing entry with the computed number of free slots
#[derive(Debug, Serialize)]
pub struct PublicTeamResponse {
    #[serde(flatten)]
    pub team: PublicTeam,
    pub free_slots: i64,
}

/// The caller's team with its roster
#[derive(Debug, Serialize)]
pub struct MyTeamResponse {
    pub team: Team,
    pub role: TeamRole,
    pub leader: RosterEntry,
    pub members: Vec<RosterEntry>,
    pub free_slots: i64,
}

impl MyTeamResponse {
    /// Split a roster (leader first) into leader and members
    fn from_roster(team: Team, caller_id: Uuid, roster: Vec<RosterEntry>) -> Result<Self> {
        let mut entries = roster.into_iter();
        let leader = entries
            .next()
            .filter(|entry| entry.participation_id == team.leader_id)
            .ok_or_else(|| Error::Internal("Team roster is missing its leader".to_string()))?;
        let members: Vec<RosterEntry> = entries.collect();

        let role = if team.is_leader(caller_id) {
            TeamRole::Leader
        } else {
            TeamRole::Member
        };
        let free_slots = team.free_slots(members.len() as i64);

        Ok(Self {
            team,
            role,
            leader,
            members,
            free_slots,
        })
    }
}

/// Pick a code not yet used in the event
async fn unused_code_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event_id: Uuid,
) -> Result<String> {
    for _ in 0..CODE_GENERATION_ATTEMPTS {
        let code = generate_team_code();
        if !code_exists_tx(tx, event_id, &code).await? {
            return Ok(code);
        }
    }
    Err(Error::Internal("Could not generate a unique team code".to_string()))
}

/// Create a team
///
/// **POST /v1/events/{event_id}/teams**
///
/// The caller becomes the leader. They must hold an active participation
/// and not already lead or belong to a team for the event.
pub async fn create_team(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateTeamRequest>,
) -> Result<ActionResponse<Team>> {
    let event = load_event(&state, event_id).await?;

    let mut tx = begin(&state).await?;
    let leader = caller_participation_tx(&mut tx, ctx.user_id(), event_id).await?;

    if find_team_link_tx(&mut tx, leader.id).await?.is_some() {
        return Err(Error::Conflict(
            "You are already in a team for this event".to_string(),
        ));
    }

    let code = match req.code {
        Some(code) => code,
        None => unused_code_tx(&mut tx, event_id).await?,
    };
    let team = Team::new(&event, &leader, &req.name, Some(code), req.visibility)?;
    let created = insert_team_tx(&mut tx, &team)
        .await
        .map_err(map_team_write_error)?;

    delete_pending_requests_tx(&mut tx, leader.id, None).await?;
    commit(tx).await?;

    tracing::info!(
        team_id = %created.id,
        event_id = %event_id,
        user_id = %ctx.user_id(),
        "Team created"
    );

    Ok(ActionResponse::with_message(created, "Team created").created())
}

/// **GET /v1/events/{event_id}/teams**
pub async fn list_public_teams(
    AuthUser(_ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(event_id): Path<Uuid>,
) -> Result<ActionResponse<Vec<PublicTeamResponse>>> {
    load_event(&state, event_id).await?;

    let teams = state.repos.teams.list_public(event_id).await?;
    let responses = teams
        .into_iter()
        .map(|team| PublicTeamResponse {
            free_slots: team.free_slots(),
            team,
        })
        .collect();

    Ok(ActionResponse::ok(responses))
}

/// The caller's team for an event
///
/// **GET /v1/events/{event_id}/teams/mine**
///
/// Answers with `data: null` when the caller is not in a team.
pub async fn get_my_team(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(event_id): Path<Uuid>,
) -> Result<ActionResponse<Option<MyTeamResponse>>> {
    let participation = state
        .events
        .participations
        .find_by_user_and_event(ctx.user_id(), event_id)
        .await?
        .ok_or_else(|| Error::NotFound("You are not registered for this event".to_string()))?;

    let Some(team) = state
        .repos
        .teams
        .find_for_participation(participation.id)
        .await?
    else {
        return Ok(ActionResponse::ok(None));
    };

    let roster = state.repos.teams.roster(&team).await?;
    let response = MyTeamResponse::from_roster(team, participation.id, roster)?;

    Ok(ActionResponse::ok(Some(response)))
}

/// Update team settings
///
/// **PATCH /v1/teams/{team_id}**
pub async fn update_team(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTeamRequest>,
) -> Result<ActionResponse<Team>> {
    let mut team = load_team(&state, team_id).await?;
    let caller = state
        .events
        .participations
        .find_by_user_and_event(ctx.user_id(), team.event_id)
        .await?
        .ok_or_else(|| Error::Authorization("Only the team leader can do this".to_string()))?;
    require_leader(&team, &caller)?;

    if let Some(ref name) = req.name {
        team.rename(name)?;
    }
    if let Some(visibility) = req.visibility {
        team.visibility = visibility;
    }
    if let Some(ref code) = req.code {
        team.set_code(code)?;
    } else if req.regenerate_code {
        let mut code = generate_team_code();
        for _ in 1..CODE_GENERATION_ATTEMPTS {
            if !state.repos.teams.code_exists(team.event_id, &code).await? {
                break;
            }
            code = generate_team_code();
        }
        team.set_code(&code)?;
    }

    let updated = state.repos.teams.update(&team).await?;

    tracing::info!(team_id = %updated.id, user_id = %ctx.user_id(), "Team updated");

    Ok(ActionResponse::with_message(updated, "Team updated"))
}

/// Leave a team
///
/// **POST /v1/teams/{team_id}/leave**
///
/// A member simply leaves. A leader may only leave an empty team, which
/// deletes it.
pub async fn leave_team(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<ActionResponse<()>> {
    let mut tx = begin(&state).await?;

    let team = lock_team_tx(&mut tx, team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    let caller = caller_participation_tx(&mut tx, ctx.user_id(), team.event_id).await?;

    let message = if team.is_leader(caller.id) {
        if count_members_tx(&mut tx, team.id).await? > 0 {
            return Err(Error::Conflict(
                "Transfer leadership or remove your members before leaving".to_string(),
            ));
        }
        delete_team_tx(&mut tx, team.id).await?;
        "Team deleted"
    } else {
        if !delete_member_tx(&mut tx, team.id, caller.id).await? {
            return Err(Error::NotFound("Not a member of this team".to_string()));
        }
        "Left team"
    };

    commit(tx).await?;

    tracing::info!(team_id = %team.id, user_id = %ctx.user_id(), outcome = message, "Left team");

    Ok(ActionResponse::message(message))
}

/// Hand leadership to a current member
///
/// **POST /v1/teams/{team_id}/transfer**
///
/// The old leader becomes a member in the same transaction, so the team
/// size does not change.
pub async fn transfer_team_leadership(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<TransferLeadershipRequest>,
) -> Result<ActionResponse<Team>> {
    let mut tx = begin(&state).await?;

    let team = lock_team_tx(&mut tx, team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    let caller = caller_participation_tx(&mut tx, ctx.user_id(), team.event_id).await?;
    require_leader(&team, &caller)?;

    if req.participation_id == caller.id {
        return Err(Error::Validation("You already lead this team".to_string()));
    }
    find_member_tx(&mut tx, team.id, req.participation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Not a member of this team".to_string()))?;

    delete_member_tx(&mut tx, team.id, req.participation_id).await?;
    let updated = set_leader_tx(&mut tx, team.id, req.participation_id)
        .await
        .map_err(map_team_write_error)?;
    insert_member_tx(&mut tx, &TeamMember::new(team.id, caller.id)).await?;

    commit(tx).await?;

    tracing::info!(
        team_id = %team.id,
        from_participation = %caller.id,
        to_participation = %req.participation_id,
        "Team leadership transferred"
    );

    Ok(ActionResponse::with_message(updated, "Leadership transferred"))
}

/// Remove a member from the team
///
/// **DELETE /v1/teams/{team_id}/members/{participation_id}**
///
/// The member's participation is deleted with the membership, and their
/// account too when it has no other participation left.
pub async fn remove_team_member(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path((team_id, participation_id)): Path<(Uuid, Uuid)>,
) -> Result<ActionResponse<()>> {
    let mut tx = begin(&state).await?;

    let team = lock_team_tx(&mut tx, team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    let caller = caller_participation_tx(&mut tx, ctx.user_id(), team.event_id).await?;
    require_leader(&team, &caller)?;

    if participation_id == caller.id {
        return Err(Error::Validation(
            "Leaders cannot remove themselves; leave or delete the team".to_string(),
        ));
    }
    if !delete_member_tx(&mut tx, team.id, participation_id).await? {
        return Err(Error::NotFound("Not a member of this team".to_string()));
    }

    let member = lock_participation_tx(&mut tx, participation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Participation not found".to_string()))?;
    delete_participation_tx(&mut tx, member.id).await?;

    let account_deleted = count_participations_for_user_tx(&mut tx, member.user_id).await? == 0;
    if account_deleted {
        delete_user_tx(&mut tx, member.user_id).await?;
    }

    commit(tx).await?;

    tracing::info!(
        team_id = %team.id,
        participation_id = %participation_id,
        leader_user_id = %ctx.user_id(),
        account_deleted = account_deleted,
        "Team member removed"
    );

    Ok(ActionResponse::message("Member removed"))
}

/// Delete an empty team
///
/// **DELETE /v1/teams/{team_id}**
pub async fn delete_team(
    AuthUser(ctx): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<ActionResponse<()>> {
    let mut tx = begin(&state).await?;

    let team = lock_team_tx(&mut tx, team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
    let caller = caller_participation_tx(&mut tx, ctx.user_id(), team.event_id).await?;
    require_leader(&team, &caller)?;

    if count_members_tx(&mut tx, team.id).await? > 0 {
        return Err(Error::Conflict(
            "Remove all members before deleting the team".to_string(),
        ));
    }
    delete_team_tx(&mut tx, team.id).await?;

    commit(tx).await?;

    tracing::info!(team_id = %team.id, user_id = %ctx.user_id(), "Team deleted");

    Ok(ActionResponse::message("Team deleted"))
}
