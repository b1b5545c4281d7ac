//! Route definitions for the teams domain API

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers::{join_requests, teams};
use super::middleware::TeamsState;

/// Team lifecycle routes
fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/v1/events/{event_id}/teams",
            get(teams::list_public_teams).post(teams::create_team),
        )
        .route("/v1/events/{event_id}/teams/mine", get(teams::get_my_team))
        .route(
            "/v1/teams/{team_id}",
            patch(teams::update_team).delete(teams::delete_team),
        )
        .route("/v1/teams/{team_id}/leave", post(teams::leave_team))
        .route(
            "/v1/teams/{team_id}/transfer",
            post(teams::transfer_team_leadership),
        )
        .route(
            "/v1/teams/{team_id}/members/{participation_id}",
            delete(teams::remove_team_member),
        )
}

/// Direct joins and join request routes
fn join_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams/{team_id}/join", post(join_requests::join_team))
        .route(
            "/v1/teams/{team_id}/join-requests",
            get(join_requests::list_team_join_requests).post(join_requests::request_to_join),
        )
        .route(
            "/v1/events/{event_id}/join-requests",
            post(join_requests::request_to_join_by_code),
        )
        .route(
            "/v1/events/{event_id}/join-requests/mine",
            get(join_requests::list_my_join_requests),
        )
        .route(
            "/v1/join-requests/{request_id}",
            delete(join_requests::cancel_join_request),
        )
        .route(
            "/v1/join-requests/{request_id}/respond",
            post(join_requests::respond_to_join_request),
        )
}

/// Create all teams domain API routes
pub fn routes() -> Router<TeamsState> {
    Router::new().merge(team_routes()).merge(join_routes())
}
