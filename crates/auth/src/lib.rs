//! Authentication middleware for the Regdesk API
//!
//! Provides JWT validation, just-in-time user provisioning, and axum extractors
//! that work with any domain state implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod types;

pub use backend::AuthBackend;
pub use claims::SessionClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::{AdminUser, AuthUser};
pub use types::{AuthIdentity, AuthRole};
