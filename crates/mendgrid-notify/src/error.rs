//! Notification error types.

use thiserror::Error;

/// A report could not be delivered. Always logged and swallowed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid notification endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to reach {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("{endpoint} answered {status}")]
    Rejected { endpoint: String, status: u16 },

    #[error("timed out delivering to {endpoint}")]
    Timeout { endpoint: String },

    #[error("failed to encode report: {0}")]
    Encode(String),
}
