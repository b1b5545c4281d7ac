//! Regdesk application composition root
//!
//! Composes the events and teams routers into a single application and
//! provides the HTTP layers shared by the `local` and `lambda` binaries.

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use regdesk_auth::{AuthBackend, AuthConfig};
use regdesk_common::Config;
use regdesk_email::{EmailConfig, EmailService, EmailServiceFactory};
use regdesk_events::{EventsRepositories, EventsState};
use regdesk_teams::{TeamsRepositories, TeamsState};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
};

/// JSON bodies are small; screenshots go to object storage, not through the API
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Create the main application router, building the email service from the environment
pub async fn create_app(config: &Config, pool: PgPool) -> anyhow::Result<Router> {
    let email_config = EmailConfig::from_env()?;
    let email = EmailServiceFactory::create(email_config).await?;

    Ok(build_router(config, pool, email))
}

/// Compose domain routers over shared infrastructure
pub fn build_router(config: &Config, pool: PgPool, email: Arc<dyn EmailService>) -> Router {
    let auth = AuthBackend::new(
        pool.clone(),
        AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            admin_emails: config.admin_emails.clone(),
        },
    );
    let events_repos = EventsRepositories::new(pool.clone());

    let events_state = EventsState {
        repos: events_repos.clone(),
        auth: auth.clone(),
        email: email.clone(),
        storage: config.storage(),
    };

    let teams_state = TeamsState {
        repos: TeamsRepositories::new(pool),
        events: events_repos,
        auth,
        email,
    };

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { concat!("Regdesk API v", env!("CARGO_PKG_VERSION")) }),
        )
        .merge(regdesk_events::routes().with_state(events_state))
        .merge(regdesk_teams::routes().with_state(teams_state))
}

/// CORS for the configured comma-separated origins; permissive when unset
pub fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
