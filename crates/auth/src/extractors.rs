//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::AuthBackend;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::jwt::extract_bearer_token;

/// Authenticated user extractor (bearer JWT)
#[derive(Debug)]
pub struct AuthUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = extract_bearer_token(auth_header)?;
        let auth_context = backend.authenticate_jwt(&token).await?;

        Ok(AuthUser(auth_context))
    }
}

/// Administrator extractor.
///
/// Like `AuthUser` but rejects non-admin callers with 403 FORBIDDEN.
#[derive(Debug)]
pub struct AdminUser(pub AuthContext);

impl<S> FromRequestParts<S> for AdminUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let AuthUser(auth_context) = AuthUser::from_request_parts(parts, state).await?;

        if !auth_context.is_admin() {
            tracing::debug!(user_id = %auth_context.user.id, "Non-admin rejected from admin route");
            return Err(AuthError::InsufficientRole);
        }

        Ok(AdminUser(auth_context))
    }
}
