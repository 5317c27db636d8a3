//! Error types for the RPC layer.
//!
//! `RpcError` is for faults on the caller's side of the bus. Anything the
//! callee reports arrives as a `Response` with an error status instead.

use shared_bus::BusError;
use shared_types::{CorrelationId, EnvelopeError, Response, StatusCode};
use thiserror::Error;

/// Client-side call failures.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Empty topic, zero timeout and the like. Nothing was registered.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The request could not be published. Nothing is left pending.
    #[error("Transport failure: {0}")]
    Transport(#[from] BusError),

    /// The payload could not be serialized.
    #[error("Failed to encode payload: {0}")]
    Encode(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Returned by `CorrelationRegistry::register_with_id`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The id is still in use by an outstanding call.
    #[error("Correlation id {0} is already pending")]
    DuplicateCorrelationId(CorrelationId),
}

/// Business failures raised by RPC handlers.
///
/// Converted into a reply envelope at the server boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Invalid { message: String, errors: Vec<String> },

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Invalid { .. } => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The reply envelope carrying this failure.
    pub fn into_response<T>(self) -> Response<T> {
        match self {
            Self::Invalid { message, errors } => Response::validation(message, errors),
            other => Response::error(other.status(), other.to_string()),
        }
    }
}
