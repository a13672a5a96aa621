//! Error types for the webhook server.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use issue_exporter::TrackerError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the webhook server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// The request body was not valid JSON.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Invalid startup configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A secret file exists but could not be read.
    #[error("failed to read secret {}: {}", .0.display(), .1)]
    Secret(PathBuf, std::io::Error),

    /// The tracker client could not be built.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "invalid_payload"),
            Self::BindFailed(_, _)
            | Self::Config(_)
            | Self::Secret(_, _)
            | Self::Tracker(_)
            | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
