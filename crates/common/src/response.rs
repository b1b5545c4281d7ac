//! Success envelope shared by all action handlers
//!
//! Every action answers with `{"status": "success" | "error", "message"?, "data"?}`.
//! Errors are rendered by [`crate::Error`]; this type covers the success side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Discriminated success payload
#[derive(Debug, Serialize)]
pub struct ActionResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip)]
    http_status: StatusCode,
}

impl<T: Serialize> ActionResponse<T> {
    /// Success carrying data
    pub fn ok(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
            http_status: StatusCode::OK,
        }
    }

    /// Success carrying data and a human-readable message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: Some(data),
            http_status: StatusCode::OK,
        }
    }

    /// Mark the response as `201 Created`
    pub fn created(mut self) -> Self {
        self.http_status = StatusCode::CREATED;
        self
    }
}

impl ActionResponse<()> {
    /// Success without data
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: None,
            http_status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ActionResponse<T> {
    fn into_response(self) -> Response {
        let status = self.http_status;
        (status, Json(self)).into_response()
    }
}
