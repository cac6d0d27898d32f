//! Decode errors for inbound wire payloads.

use thiserror::Error;

/// Errors raised while decoding an inbound payload into an envelope.
///
/// Any of these means the payload did not match the fixed tuple schema for
/// its transport. Callers at the transport boundary log and drop the
/// message; they never propagate a decode failure into the host event loop.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not a JSON array.
    #[error("payload is not an array")]
    NotAnArray,

    /// The payload array had the wrong number of elements.
    #[error("expected a {expected}-element tuple, got {got} elements")]
    WrongArity {
        /// Elements required by the transport's wire shape.
        expected: usize,
        /// Elements actually present.
        got: usize,
    },

    /// The message-name slot did not hold a string.
    #[error("message name is not a string")]
    BadName,

    /// The correlation-id slot held something other than an unsigned
    /// integer or null.
    #[error("correlation id is not an unsigned integer")]
    BadCorrelation,

    /// A text payload was not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
