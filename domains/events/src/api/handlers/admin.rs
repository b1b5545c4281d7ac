//! Administrator payment review handlers

use axum::extract::{Path, Query, State};
use regdesk_auth::AdminUser;
use regdesk_common::{ActionResponse, Error, Pagination, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::handlers::events::load_event;
use crate::api::handlers::participations::ParticipationResponse;
use crate::api::middleware::EventsState;
use crate::domain::entities::{Participation, ParticipationStatus, PaymentMode};
use crate::domain::state::{ParticipationEvent, ParticipationGuardContext};
use crate::repository::{
    find_event_tx, find_team_link_tx, lock_participation_tx, lock_team_member_participations_tx,
    save_payment_state_tx, set_status_tx, TeamLink,
};

/// `?status=` filter for the admin participation list
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<ParticipationStatus>,
}

/// Request for rejecting a payment proof
#[derive(Debug, Deserialize, Validate)]
pub struct RejectPaymentRequest {
    /// Shown to the participant
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// One page of a list plus the total row count
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

/// Outcome of a verification
#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub participation: ParticipationResponse,
    /// Team members confirmed along with a paying leader
    pub covered_member_ids: Vec<Uuid>,
}

/// **GET /v1/admin/events/{event_id}/participations?status=&offset=&limit=**
pub async fn admin_list_participations(
    AdminUser(_ctx): AdminUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<Pagination>,
) -> Result<ActionResponse<PagedResponse<ParticipationResponse>>> {
    load_event(&state, event_id).await?;

    let participations = state
        .repos
        .participations
        .list_by_event(event_id, filter.status, page.offset(), page.limit())
        .await?;
    let total = state
        .repos
        .participations
        .count_by_event(event_id, filter.status)
        .await?;

    Ok(ActionResponse::ok(PagedResponse {
        items: participations
            .into_iter()
            .map(|p| ParticipationResponse::new(p, &state.storage))
            .collect(),
        total,
        offset: page.offset(),
        limit: page.limit(),
    }))
}

/// Verify a payment
///
/// **POST /v1/admin/participations/{participation_id}/verify**
///
/// A `REGISTERED` participation of a free event is confirmed directly. In
/// `team` payment mode, verifying the leader also confirms every current
/// member that is not yet confirmed.
pub async fn verify_payment(
    AdminUser(ctx): AdminUser,
    State(state): State<EventsState>,
    Path(participation_id): Path<Uuid>,
) -> Result<ActionResponse<VerificationResponse>> {
    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let mut participation = lock_participation_tx(&mut tx, participation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Participation not found".to_string()))?;
    let event = find_event_tx(&mut tx, participation.event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))?;

    if participation.status == ParticipationStatus::Registered {
        participation.confirm(ctx.user_id())?;
    } else {
        participation.verify_payment(ctx.user_id())?;
    }
    let saved = save_payment_state_tx(&mut tx, &participation).await?;

    let mut covered: Vec<Participation> = Vec::new();
    if event.payment_mode == PaymentMode::Team {
        if let Some(TeamLink::Leader { .. }) = find_team_link_tx(&mut tx, saved.id).await? {
            let guard = ParticipationGuardContext {
                leader_status: Some(saved.status),
            };
            for mut member in lock_team_member_participations_tx(&mut tx, saved.id).await? {
                if !member.is_active() || member.status == ParticipationStatus::Confirmed {
                    continue;
                }
                member.status =
                    member.next_status(ParticipationEvent::CoveredByTeam, Some(&guard))?;
                set_status_tx(&mut tx, member.id, member.status).await?;
                covered.push(member);
            }
        }
    }

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        participation_id = %saved.id,
        admin_id = %ctx.user_id(),
        covered_members = covered.len(),
        "Payment verified"
    );

    for recipient in std::iter::once(&saved).chain(covered.iter()) {
        if let Err(e) = state
            .email
            .send_payment_confirmed(
                &recipient.profile.email,
                &recipient.profile.full_name,
                &event.name,
                recipient.id,
            )
            .await
        {
            tracing::warn!(error = %e, participation_id = %recipient.id, "Failed to send confirmation email");
        }
    }

    Ok(ActionResponse::with_message(
        VerificationResponse {
            participation: ParticipationResponse::new(saved, &state.storage),
            covered_member_ids: covered.iter().map(|m| m.id).collect(),
        },
        "Payment verified",
    ))
}

/// Reject a payment proof
///
/// **POST /v1/admin/participations/{participation_id}/reject**
///
/// The participation returns to `PENDING_PAYMENT` and may submit again.
pub async fn reject_payment(
    AdminUser(ctx): AdminUser,
    State(state): State<EventsState>,
    Path(participation_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<RejectPaymentRequest>,
) -> Result<ActionResponse<ParticipationResponse>> {
    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let mut participation = lock_participation_tx(&mut tx, participation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Participation not found".to_string()))?;

    participation.reject_payment(req.reason.trim().to_string())?;
    let saved = save_payment_state_tx(&mut tx, &participation).await?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(participation_id = %saved.id, admin_id = %ctx.user_id(), "Payment rejected");

    let event = load_event(&state, saved.event_id).await?;
    let reason = saved.rejection_reason.as_deref().unwrap_or_default();
    if let Err(e) = state
        .email
        .send_payment_rejected(
            &saved.profile.email,
            &saved.profile.full_name,
            &event.name,
            saved.id,
            reason,
        )
        .await
    {
        tracing::warn!(error = %e, participation_id = %saved.id, "Failed to send rejection email");
    }

    Ok(ActionResponse::with_message(
        ParticipationResponse::new(saved, &state.storage),
        "Payment rejected",
    ))
}

/// Resend the confirmation email
///
/// **POST /v1/admin/participations/{participation_id}/send-confirmation**
///
/// Sending is the whole action here, so a delivery failure is an error.
pub async fn send_confirmation(
    AdminUser(ctx): AdminUser,
    State(state): State<EventsState>,
    Path(participation_id): Path<Uuid>,
) -> Result<ActionResponse<()>> {
    let participation = state
        .repos
        .participations
        .find(participation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Participation not found".to_string()))?;

    if participation.status != ParticipationStatus::Confirmed {
        return Err(Error::Conflict(format!(
            "Only confirmed participations can be sent a confirmation (status is {})",
            participation.status
        )));
    }

    let event = load_event(&state, participation.event_id).await?;

    state
        .email
        .send_payment_confirmed(
            &participation.profile.email,
            &participation.profile.full_name,
            &event.name,
            participation.id,
        )
        .await
        .map_err(|e| Error::Internal(format!("Failed to send confirmation email: {}", e)))?;

    tracing::info!(participation_id = %participation.id, admin_id = %ctx.user_id(), "Confirmation email resent");

    Ok(ActionResponse::message("Confirmation email sent"))
}
