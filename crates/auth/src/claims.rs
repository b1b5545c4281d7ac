//! JWT claims types

use serde::{Deserialize, Serialize};

/// Claims carried by the session token issued by the identity provider
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Option<String>,
    /// Display name, used when provisioning the account
    #[serde(default)]
    pub name: Option<String>,
    pub iat: u64,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}
