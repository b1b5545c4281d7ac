//! Authorization context for authenticated users

use uuid::Uuid;

use crate::types::{AuthIdentity, AuthRole};

/// Represents an authenticated user context
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthIdentity,
}

impl AuthContext {
    pub fn new(user: AuthIdentity) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Check if user is an administrator
    pub fn is_admin(&self) -> bool {
        self.user.role == AuthRole::Admin
    }

    /// Owner-or-admin check used by participation lookups
    pub fn can_access_user(&self, user_id: Uuid) -> bool {
        self.user.id == user_id || self.is_admin()
    }
}
