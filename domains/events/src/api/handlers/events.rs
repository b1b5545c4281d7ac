//! Event catalogue handlers
//!
//! Listing and reading events is public; creating and editing them is
//! restricted to administrators.

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use regdesk_auth::AdminUser;
use regdesk_common::{ActionResponse, Error, Result, ValidatedJson};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::EventsState;
use crate::domain::entities::{Event, PaymentMode, MAX_TEAM_SIZE};
use crate::domain::validation::slug_format;

/// Request for creating an event
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 64), custom(function = "slug_format"))]
    pub slug: String,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub description: Option<String>,

    /// Registration fee; 0 for free events
    #[serde(default)]
    pub fee: Decimal,

    #[validate(range(min = 1, max = 50))]
    pub min_team_size: Option<i32>,

    /// Team size including the leader; 1 (default) for solo events
    #[validate(range(min = 1, max = 50))]
    pub max_team_size: Option<i32>,

    pub payment_mode: Option<PaymentMode>,
    pub registration_open: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
}

/// Request for updating an event; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub fee: Option<Decimal>,
    #[validate(range(min = 1, max = 50))]
    pub min_team_size: Option<i32>,
    #[validate(range(min = 1, max = 50))]
    pub max_team_size: Option<i32>,
    pub payment_mode: Option<PaymentMode>,
    /// Open or close registration
    pub registration_open: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
}

impl UpdateEventRequest {
    /// Apply the present fields and re-check the event's invariants
    pub fn apply(self, event: &mut Event) -> Result<()> {
        if let Some(name) = self.name {
            event.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            event.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(fee) = self.fee {
            event.fee = fee;
        }
        if let Some(min) = self.min_team_size {
            event.min_team_size = min;
        }
        if let Some(max) = self.max_team_size {
            event.max_team_size = max;
        }
        if let Some(mode) = self.payment_mode {
            event.payment_mode = mode;
        }
        if let Some(open) = self.registration_open {
            event.registration_open = open;
        }
        if let Some(starts_at) = self.starts_at {
            event.starts_at = Some(starts_at);
        }
        event.validate()
    }
}

pub(crate) async fn load_event(state: &EventsState, event_id: Uuid) -> Result<Event> {
    state
        .repos
        .events
        .find(event_id)
        .await?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))
}

/// **GET /v1/events**
pub async fn list_events(State(state): State<EventsState>) -> Result<ActionResponse<Vec<Event>>> {
    let events = state.repos.events.list().await?;
    Ok(ActionResponse::ok(events))
}

/// **GET /v1/events/{event_id}**
pub async fn get_event(
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
) -> Result<ActionResponse<Event>> {
    let event = load_event(&state, event_id).await?;
    Ok(ActionResponse::ok(event))
}

/// Create an event
///
/// **POST /v1/events**
///
/// Slugs are unique; a duplicate answers 409.
pub async fn create_event(
    AdminUser(ctx): AdminUser,
    State(state): State<EventsState>,
    ValidatedJson(req): ValidatedJson<CreateEventRequest>,
) -> Result<ActionResponse<Event>> {
    let mut event = Event::new(
        req.slug,
        req.name.trim().to_string(),
        req.fee,
        req.max_team_size.unwrap_or(1).min(MAX_TEAM_SIZE),
    )?;
    event.description = req.description.filter(|d| !d.trim().is_empty());
    event.min_team_size = req.min_team_size.unwrap_or(1);
    event.payment_mode = req.payment_mode.unwrap_or_default();
    event.registration_open = req.registration_open.unwrap_or(true);
    event.starts_at = req.starts_at;
    event.validate()?;

    let created = state.repos.events.create(&event).await?;

    tracing::info!(event_id = %created.id, slug = %created.slug, admin_id = %ctx.user.id, "Event created");

    Ok(ActionResponse::with_message(created, "Event created").created())
}

/// Update an event
///
/// **PATCH /v1/events/{event_id}**
///
/// Existing teams keep the `max_members` they were created with.
pub async fn update_event(
    AdminUser(ctx): AdminUser,
    State(state): State<EventsState>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateEventRequest>,
) -> Result<ActionResponse<Event>> {
    let mut event = load_event(&state, event_id).await?;
    req.apply(&mut event)?;

    let updated = state.repos.events.update(&event).await?;

    tracing::info!(
        event_id = %updated.id,
        registration_open = updated.registration_open,
        admin_id = %ctx.user.id,
        "Event updated"
    );

    Ok(ActionResponse::with_message(updated, "Event updated"))
}
