//! Error types for the issue-exporter crate.

use thiserror::Error;

/// Errors returned by a [`TicketTracker`](crate::tracker::TicketTracker).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker could not be reached (DNS, connect, timeout, TLS).
    #[error("tracker unreachable: {reason}")]
    Unreachable {
        /// The transport-level failure.
        reason: String,
    },

    /// The tracker answered with a non-success status code.
    #[error("tracker rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the tracker.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The tracker answered with a body that could not be decoded.
    #[error("invalid tracker response: {reason}")]
    InvalidResponse {
        /// What was wrong with the response.
        reason: String,
    },

    /// The requested ticket does not exist.
    #[error("ticket not found: {id}")]
    NotFound {
        /// The ticket id that was looked up.
        id: u64,
    },

    /// The tracker client was configured with invalid settings.
    #[error("invalid tracker configuration: {reason}")]
    Config {
        /// The reason the configuration is invalid.
        reason: String,
    },
}

impl TrackerError {
    /// Returns true if the failure happened before the tracker answered.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse {
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Unreachable {
                reason: err.to_string(),
            }
        }
    }
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Reasons an inbound webhook body cannot be turned into an [`Alert`](crate::types::Alert).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The `status` field is absent or not a string.
    #[error("payload has no status")]
    MissingStatus,

    /// The `status` field holds a value other than `firing` or `resolved`.
    #[error("unknown alert status: {0}")]
    UnknownStatus(String),

    /// The `commonAnnotations` object is absent.
    #[error("payload has no commonAnnotations")]
    MissingAnnotations,

    /// Neither `message` nor `summary` is set in `commonAnnotations`.
    #[error("payload has no alert message")]
    MissingTitle,
}
