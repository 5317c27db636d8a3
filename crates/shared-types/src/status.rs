//! # Status Codes
//!
//! Reply status codes reuse HTTP semantics: `2xx` success, `4xx` caller
//! error, `5xx` callee error.

use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns true for `200 <= status < 300`.
#[must_use]
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Returns true for `status >= 400`.
#[must_use]
pub fn is_error(status: u16) -> bool {
    status >= 400
}

/// A validated reply status.
///
/// Only values in `100..=599` can be constructed. Decoding goes through the
/// same check, so a negative or missing status on the wire fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const REQUEST_TIMEOUT: StatusCode = StatusCode(408);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Validate and wrap a raw status.
    pub fn new(code: u16) -> Result<Self, EnvelopeError> {
        if (100..=599).contains(&code) {
            Ok(Self(code))
        } else {
            Err(EnvelopeError::InvalidStatus(i64::from(code)))
        }
    }

    /// The raw numeric value.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        is_success(self.0)
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        is_error(self.0)
    }
}

impl TryFrom<i64> for StatusCode {
    type Error = EnvelopeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let code = u16::try_from(value).map_err(|_| EnvelopeError::InvalidStatus(value))?;
        Self::new(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> Self {
        status.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
