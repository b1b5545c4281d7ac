//! Participant-facing registration and payment handlers
//!
//! Every route here acts on the caller's own participation. Payment and
//! cancellation run inside a transaction holding the participation row lock.

use axum::extract::{Path, State};
use regdesk_auth::AuthUser;
use regdesk_common::{ActionResponse, Error, Result, StorageConfig, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::handlers::events::load_event;
use crate::api::middleware::EventsState;
use crate::domain::entities::{Participation, PaymentMode, ProfileSnapshot};
use crate::domain::validation::{phone_format, transaction_id_format};
use crate::repository::{
    detach_from_teams_tx, find_team_link_tx, lock_participation_for_user_tx, lock_team_row_tx,
    save_payment_state_tx, set_status_tx, TeamLink,
};

/// Request for registering to an event
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    /// Contact email; defaults to the account email
    #[validate(email)]
    pub email: Option<String>,

    #[validate(custom(function = "phone_format"))]
    pub phone: Option<String>,

    #[validate(length(max = 200))]
    pub institution: Option<String>,
}

impl RegisterRequest {
    fn into_profile(self, account_email: &str) -> ProfileSnapshot {
        ProfileSnapshot {
            full_name: self.full_name.trim().to_string(),
            email: self.email.unwrap_or_else(|| account_email.to_string()),
            phone: self.phone,
            institution: self.institution.filter(|i| !i.trim().is_empty()),
        }
    }
}

/// Request for editing the contact fields; absent fields are kept
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "phone_format"))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub institution: Option<String>,
}

impl UpdateProfileRequest {
    fn merge(self, current: &ProfileSnapshot) -> ProfileSnapshot {
        ProfileSnapshot {
            full_name: self
                .full_name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.full_name.clone()),
            email: self.email.unwrap_or_else(|| current.email.clone()),
            phone: self.phone.or_else(|| current.phone.clone()),
            institution: self.institution.or_else(|| current.institution.clone()),
        }
    }
}

/// Request for submitting a payment proof
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPaymentRequest {
    /// Bank or UPI reference of the transfer
    #[validate(custom(function = "transaction_id_format"))]
    pub transaction_id: String,

    /// Object key of the uploaded screenshot
    #[validate(length(min = 1, max = 512))]
    pub screenshot_key: String,
}

/// Participation with its resolved payment proof link
#[derive(Debug, Serialize)]
pub struct ParticipationResponse {
    #[serde(flatten)]
    pub participation: Participation,
    pub payment_proof_url: Option<String>,
}

impl ParticipationResponse {
    pub fn new(participation: Participation, storage: &StorageConfig) -> Self {
        let payment_proof_url = participation.payment_proof_url(storage);
        Self {
            participation,
            payment_proof_url,
        }
    }
}

/// Register for an event
///
/// **POST /v1/events/{event_id}/register**
///
/// Free events start in `REGISTERED`, paid ones in `PENDING_PAYMENT`.
pub async fn register_for_event(
    AuthUser(ctx): AuthUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<ActionResponse<ParticipationResponse>> {
    let user = &ctx.user;
    let event = load_event(&state, event_id).await?;

    if !event.registration_open {
        return Err(Error::Conflict(
            "Registration for this event is closed".to_string(),
        ));
    }

    if let Some(existing) = state
        .repos
        .participations
        .find_by_user_and_event(user.id, event_id)
        .await?
    {
        return Err(Error::Conflict(if existing.is_active() {
            "Already registered for this event".to_string()
        } else {
            "Your registration was cancelled; contact the organisers".to_string()
        }));
    }

    let participation = Participation::new(user.id, &event, req.into_profile(&user.email))?;
    let created = state.repos.participations.create(&participation).await?;

    tracing::info!(
        user_id = %user.id,
        event_id = %event_id,
        participation_id = %created.id,
        status = %created.status,
        "Participant registered"
    );

    Ok(ActionResponse::with_message(
        ParticipationResponse::new(created, &state.storage),
        "Registered",
    )
    .created())
}

/// **GET /v1/events/{event_id}/participation**
pub async fn get_my_participation(
    AuthUser(ctx): AuthUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
) -> Result<ActionResponse<ParticipationResponse>> {
    let participation = state
        .repos
        .participations
        .find_by_user_and_event(ctx.user_id(), event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Not registered for this event".to_string()))?;

    Ok(ActionResponse::ok(ParticipationResponse::new(
        participation,
        &state.storage,
    )))
}

/// **GET /v1/participations**
pub async fn list_my_participations(
    AuthUser(ctx): AuthUser,
    State(state): State<EventsState>,
) -> Result<ActionResponse<Vec<ParticipationResponse>>> {
    let participations = state.repos.participations.list_by_user(ctx.user_id()).await?;

    let responses = participations
        .into_iter()
        .map(|p| ParticipationResponse::new(p, &state.storage))
        .collect();

    Ok(ActionResponse::ok(responses))
}

/// Edit the profile snapshot
///
/// **PATCH /v1/events/{event_id}/participation**
///
/// Join requests already sent keep the snapshot taken when they were made.
pub async fn update_profile_snapshot(
    AuthUser(ctx): AuthUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<ActionResponse<ParticipationResponse>> {
    let mut participation = state
        .repos
        .participations
        .find_by_user_and_event(ctx.user_id(), event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Not registered for this event".to_string()))?;

    let profile = req.merge(&participation.profile);
    participation.update_profile(profile)?;

    let updated = state
        .repos
        .participations
        .update_profile(participation.id, &participation.profile)
        .await?;

    tracing::info!(user_id = %ctx.user_id(), participation_id = %updated.id, "Profile snapshot updated");

    Ok(ActionResponse::with_message(
        ParticipationResponse::new(updated, &state.storage),
        "Profile updated",
    ))
}

/// Submit a payment proof
///
/// **POST /v1/events/{event_id}/participation/payment**
///
/// In `team` payment mode the leader pays for every seat currently in the
/// team and members cannot pay on their own.
pub async fn submit_payment(
    AuthUser(ctx): AuthUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SubmitPaymentRequest>,
) -> Result<ActionResponse<ParticipationResponse>> {
    if !StorageConfig::is_valid_key(&req.screenshot_key) {
        return Err(Error::Validation("Invalid screenshot key".to_string()));
    }

    let event = load_event(&state, event_id).await?;
    if event.is_free() {
        return Err(Error::Conflict("This event has no fee".to_string()));
    }

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let mut participation = lock_participation_for_user_tx(&mut tx, ctx.user_id(), event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Not registered for this event".to_string()))?;

    let seats = match (event.payment_mode, find_team_link_tx(&mut tx, participation.id).await?) {
        (PaymentMode::Team, Some(TeamLink::Member { .. })) => {
            return Err(Error::Conflict(
                "Your team leader pays for the whole team".to_string(),
            ));
        }
        (PaymentMode::Team, Some(TeamLink::Leader { member_count, .. })) => member_count + 1,
        _ => 1,
    };

    participation.submit_payment(event.amount_due(seats), req.transaction_id, req.screenshot_key)?;
    let saved = save_payment_state_tx(&mut tx, &participation).await?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        user_id = %ctx.user_id(),
        participation_id = %saved.id,
        seats = seats,
        "Payment proof submitted"
    );

    Ok(ActionResponse::with_message(
        ParticipationResponse::new(saved, &state.storage),
        "Payment submitted for review",
    ))
}

/// Cancel the caller's participation
///
/// **POST /v1/events/{event_id}/participation/cancel**
///
/// A leader whose team still has members must transfer leadership or
/// remove them first. Otherwise the participation leaves its team, a
/// memberless team it leads is deleted, and pending join requests go away.
pub async fn cancel_participation(
    AuthUser(ctx): AuthUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
) -> Result<ActionResponse<ParticipationResponse>> {
    let participation_id = state
        .repos
        .participations
        .find_by_user_and_event(ctx.user_id(), event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Not registered for this event".to_string()))?
        .id;

    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    // Team row before participation row, the order every team workflow uses
    let locked_team = match find_team_link_tx(&mut tx, participation_id).await? {
        Some(link) => lock_team_row_tx(&mut tx, link.team_id()).await?,
        None => None,
    };

    let mut participation = lock_participation_for_user_tx(&mut tx, ctx.user_id(), event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Not registered for this event".to_string()))?;

    let link = find_team_link_tx(&mut tx, participation.id).await?;
    if link.map(|l| l.team_id()) != locked_team {
        return Err(Error::Conflict(
            "Your team changed while cancelling; try again".to_string(),
        ));
    }
    if let Some(TeamLink::Leader { member_count, .. }) = link {
        if member_count > 0 {
            return Err(Error::Conflict(
                "Transfer leadership or remove your team members before cancelling".to_string(),
            ));
        }
    }

    participation.cancel()?;
    set_status_tx(&mut tx, participation.id, participation.status).await?;
    detach_from_teams_tx(&mut tx, participation.id).await?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(user_id = %ctx.user_id(), participation_id = %participation.id, "Participation cancelled");

    Ok(ActionResponse::with_message(
        ParticipationResponse::new(participation, &state.storage),
        "Registration cancelled",
    ))
}
