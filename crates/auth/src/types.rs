//! Auth read-model types
//!
//! Lightweight view of the `users` row owned by the events domain.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Identity of the caller, loaded once per request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: AuthRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account role for auth decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthRole {
    Participant,
    Admin,
}

impl AuthRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthRole::Admin)
    }
}

impl std::fmt::Display for AuthRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRole::Participant => write!(f, "participant"),
            AuthRole::Admin => write!(f, "admin"),
        }
    }
}
