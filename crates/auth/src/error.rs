//! Authentication errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    MissingAuthorization,
    InvalidAuthorizationFormat,
    InvalidToken,
    InvalidUserId,
    /// Token carries no email, so the account cannot be provisioned
    MissingEmail,
    UserLoadError,
    UserProvisionFailed,
    /// Caller lacks the admin role
    InsufficientRole,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization
            | AuthError::InvalidAuthorizationFormat
            | AuthError::InvalidToken
            | AuthError::InvalidUserId
            | AuthError::MissingEmail => StatusCode::UNAUTHORIZED,
            AuthError::UserLoadError | AuthError::UserProvisionFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }

    fn code_and_message(&self) -> (&'static str, &'static str) {
        match self {
            AuthError::MissingAuthorization => {
                ("MISSING_AUTHORIZATION", "Authorization header required")
            }
            AuthError::InvalidAuthorizationFormat => (
                "INVALID_AUTHORIZATION",
                "Invalid authorization header format",
            ),
            AuthError::InvalidToken => ("INVALID_TOKEN", "Invalid or expired token"),
            AuthError::InvalidUserId => ("INVALID_TOKEN", "Invalid user ID in token"),
            AuthError::MissingEmail => ("INVALID_TOKEN", "Token does not carry an email"),
            AuthError::UserLoadError => ("USER_LOAD_ERROR", "Failed to load user"),
            AuthError::UserProvisionFailed => {
                ("USER_PROVISION_ERROR", "Failed to provision user")
            }
            AuthError::InsufficientRole => (
                "FORBIDDEN",
                "Only administrators can access this operation",
            ),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code_and_message().1)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = self.code_and_message();

        let body = Json(json!({
            "status": "error",
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        let cases: Vec<(AuthError, StatusCode)> = vec![
            (AuthError::MissingAuthorization, StatusCode::UNAUTHORIZED),
            (
                AuthError::InvalidAuthorizationFormat,
                StatusCode::UNAUTHORIZED,
            ),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidUserId, StatusCode::UNAUTHORIZED),
            (AuthError::MissingEmail, StatusCode::UNAUTHORIZED),
            (AuthError::UserLoadError, StatusCode::INTERNAL_SERVER_ERROR),
            (
                AuthError::UserProvisionFailed,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AuthError::InsufficientRole, StatusCode::FORBIDDEN),
        ];

        for (error, expected_status) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }

    #[tokio::test]
    async fn test_auth_error_uses_error_envelope() {
        let response = AuthError::MissingAuthorization.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "MISSING_AUTHORIZATION");
        assert_eq!(body["message"], "Authorization header required");
    }
}
