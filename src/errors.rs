use crate::services::gateway::GatewayError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::Key(_)
            | GatewayError::EmptyKey(_)
            | GatewayError::ExpiryTooLong { .. } => AppError::bad_request(err.to_string()),
            GatewayError::Backend(backend) if backend.is_not_found() => {
                AppError::not_found(err.to_string())
            }
            GatewayError::Backend(_) => {
                tracing::warn!("storage backend error: {}", err);
                AppError::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            GatewayError::DeletionTimeout { .. } => {
                AppError::new(StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
        }
    }
}
