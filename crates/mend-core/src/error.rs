//! Error types for inbound alarm batches.

use thiserror::Error;

/// Result type alias for batch parsing.
pub type InputResult<T> = Result<T, InputError>;

/// A malformed alarm batch. The only error that fails a whole invocation.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("batch is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("batch must be a JSON object")]
    NotAnObject,

    #[error("`Records` must be an array")]
    RecordsNotArray,

    #[error("record {index}: missing `Sns.Message` string")]
    MissingMessage { index: usize },

    #[error("record {index}: alarm message is not a JSON object: {reason}")]
    BadMessage { index: usize, reason: String },
}
