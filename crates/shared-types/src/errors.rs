//! # Error Types
//!
//! Errors raised while building or decoding envelopes.

use thiserror::Error;

/// Errors that prevent an envelope from being constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Status outside `100..=599` (or negative on the wire).
    #[error("Invalid status code: {0}")]
    InvalidStatus(i64),

    /// A success status paired with field-level errors.
    #[error("Success status {status} cannot carry {count} field error(s)")]
    SuccessWithErrors { status: u16, count: usize },

    /// Request topic is empty.
    #[error("Request topic must not be empty")]
    EmptyTopic,

    /// Correlation header could not be parsed.
    #[error("Invalid correlation id: {0}")]
    InvalidCorrelationId(String),
}
