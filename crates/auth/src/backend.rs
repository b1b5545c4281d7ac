//! Concrete authentication backend
//!
//! Wraps `PgPool` + `AuthConfig` and owns auth-specific SQL queries.
//! Uses runtime `sqlx::query_as` (not macros) so the `users` table stays
//! owned by the events domain.

use sqlx::PgPool;
use uuid::Uuid;

use crate::claims::SessionClaims;
use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::types::{AuthIdentity, AuthRole};

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    pool: PgPool,
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) async fn find_user(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError> {
        let user: Option<AuthIdentity> = sqlx::query_as(
            r#"
            SELECT id, email, name, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "Failed to load user");
            AuthError::UserLoadError
        })?;

        Ok(user)
    }

    /// Provision a new user from JWT claims on their first authenticated request.
    ///
    /// `ON CONFLICT DO NOTHING` makes concurrent first requests converge on one row.
    async fn provision_user_from_jwt(
        &self,
        user_id: Uuid,
        claims: &SessionClaims,
    ) -> Result<AuthIdentity, AuthError> {
        let email = claims
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingEmail)?;

        let role = if self.config.is_admin_email(email) {
            AuthRole::Admin
        } else {
            AuthRole::Participant
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(claims.name.as_deref())
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user_id, "Failed to provision user");
            AuthError::UserProvisionFailed
        })?;

        tracing::info!(user_id = %user_id, email = %email, role = %role, "JIT user provisioned");

        self.find_user(user_id).await?.ok_or_else(|| {
            tracing::error!(user_id = %user_id, "User not found after provisioning");
            AuthError::UserProvisionFailed
        })
    }

    pub(crate) async fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;

        let user = match self.find_user(user_id).await? {
            Some(user) => user,
            None => self.provision_user_from_jwt(user_id, &claims).await?,
        };

        Ok(AuthContext::new(user))
    }
}
