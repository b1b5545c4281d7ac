//! Route definitions for the events domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{admin, events, participations};
use super::middleware::EventsState;

/// Event catalogue routes
fn event_routes() -> Router<EventsState> {
    Router::new()
        .route("/v1/events", get(events::list_events).post(events::create_event))
        .route(
            "/v1/events/{event_id}",
            get(events::get_event).patch(events::update_event),
        )
}

/// The caller's own registration
fn participation_routes() -> Router<EventsState> {
    Router::new()
        .route(
            "/v1/events/{event_id}/register",
            post(participations::register_for_event),
        )
        .route(
            "/v1/events/{event_id}/participation",
            get(participations::get_my_participation)
                .patch(participations::update_profile_snapshot),
        )
        .route(
            "/v1/events/{event_id}/participation/payment",
            post(participations::submit_payment),
        )
        .route(
            "/v1/events/{event_id}/participation/cancel",
            post(participations::cancel_participation),
        )
        .route(
            "/v1/participations",
            get(participations::list_my_participations),
        )
}

/// Payment review routes
fn admin_routes() -> Router<EventsState> {
    Router::new()
        .route(
            "/v1/admin/events/{event_id}/participations",
            get(admin::admin_list_participations),
        )
        .route(
            "/v1/admin/participations/{participation_id}/verify",
            post(admin::verify_payment),
        )
        .route(
            "/v1/admin/participations/{participation_id}/reject",
            post(admin::reject_payment),
        )
        .route(
            "/v1/admin/participations/{participation_id}/send-confirmation",
            post(admin::send_confirmation),
        )
}

/// Create all events domain API routes
pub fn routes() -> Router<EventsState> {
    Router::new()
        .merge(event_routes())
        .merge(participation_routes())
        .merge(admin_routes())
}
