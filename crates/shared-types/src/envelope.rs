//! # Request and Reply Envelopes
//!
//! The two shapes every call on the bus is made of.
//!
//! ## Wire Format
//!
//! A reply body is always the JSON form of `Response<T>`:
//!
//! ```text
//! { "status": 200, "data": {...} | null, "message": "...",
//!   "timestamp": "2024-01-01T00:00:00Z", "errors": ["..."] | null }
//! ```
//!
//! A request travels as a bus message whose body is the payload and whose
//! headers carry the correlation id and source tag. `RequestEnvelope` is the
//! in-process view of that message.

use crate::correlation::CorrelationId;
use crate::errors::EnvelopeError;
use crate::status::StatusCode;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// An outbound request, before it is turned into a bus message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Destination topic. Identifies the remote handler.
    pub topic: String,
    /// Opaque request body.
    pub payload: serde_json::Value,
    /// Set once per outstanding call.
    pub correlation_id: CorrelationId,
    /// Calling service, for diagnostics only.
    pub source_tag: String,
}

impl RequestEnvelope {
    /// Build a request envelope. Fails on an empty topic.
    pub fn new(
        topic: impl Into<String>,
        payload: serde_json::Value,
        correlation_id: CorrelationId,
        source_tag: impl Into<String>,
    ) -> Result<Self, EnvelopeError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(EnvelopeError::EmptyTopic);
        }
        Ok(Self {
            topic,
            payload,
            correlation_id,
            source_tag: source_tag.into(),
        })
    }
}

/// Wire form used while decoding, before the invariants are checked.
///
/// `data` stays untyped until the status is known: it only has to fit `T`
/// on a success reply.
#[derive(Deserialize)]
struct RawResponse {
    status: StatusCode,
    data: Option<serde_json::Value>,
    message: String,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

/// The reply envelope used uniformly across the system.
///
/// Invariants:
/// - a success status never carries field errors;
/// - a non-success status never exposes `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    status: StatusCode,
    data: Option<T>,
    message: String,
    timestamp: DateTime<Utc>,
    errors: Option<Vec<String>>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Response<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawResponse::deserialize(deserializer)?;
        let data = if raw.status.is_success() {
            raw.data
                .map(serde_json::from_value::<T>)
                .transpose()
                .map_err(serde::de::Error::custom)?
        } else {
            None
        };
        let mut response = Self::new(raw.status, data, raw.message, raw.errors)
            .map_err(serde::de::Error::custom)?;
        response.timestamp = raw.timestamp;
        Ok(response)
    }
}

impl<T> Response<T> {
    /// Checked general constructor.
    ///
    /// Data on a non-success status is dropped; errors on a success status
    /// are rejected. An empty error list is stored as `None`.
    pub fn new(
        status: StatusCode,
        data: Option<T>,
        message: impl Into<String>,
        errors: Option<Vec<String>>,
    ) -> Result<Self, EnvelopeError> {
        let errors = errors.filter(|e| !e.is_empty());
        if status.is_success() {
            if let Some(errors) = &errors {
                return Err(EnvelopeError::SuccessWithErrors {
                    status: status.as_u16(),
                    count: errors.len(),
                });
            }
        }
        let data = if status.is_success() { data } else { None };
        Ok(Self {
            status,
            data,
            message: message.into(),
            timestamp: Utc::now(),
            errors,
        })
    }

    /// 200 with data.
    pub fn ok(data: T) -> Self {
        Self::success(StatusCode::OK, data, "OK")
    }

    /// 201 with data.
    pub fn created(data: T) -> Self {
        Self::success(StatusCode::CREATED, data, "Created")
    }

    fn success(status: StatusCode, data: T, message: &str) -> Self {
        Self {
            status,
            data: Some(data),
            message: message.to_string(),
            timestamp: Utc::now(),
            errors: None,
        }
    }

    /// A failure with no data.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            message: message.into(),
            timestamp: Utc::now(),
            errors: None,
        }
    }

    /// 400 with field-level errors.
    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message).with_errors(errors)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::error(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::error(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// A call that got no reply before its deadline.
    pub fn timeout(operation: &str, elapsed: Duration) -> Self {
        Self::error(
            StatusCode::REQUEST_TIMEOUT,
            format!("{} timed out after {}ms", operation, elapsed.as_millis()),
        )
    }

    /// Replace the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach field errors. Ignored on a success status.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        if !self.status.is_success() && !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Field errors, empty when there are none.
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    /// Drop the data type, keeping status, message and errors.
    pub fn into_failure(self) -> Response<()> {
        Response {
            status: self.status,
            data: None,
            message: self.message,
            timestamp: self.timestamp,
            errors: self.errors,
        }
    }

    /// Split into the success data or the failure envelope.
    pub fn into_result(self) -> Result<Option<T>, Response<()>> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(self.into_failure())
        }
    }

    /// Fallible transform of the data, keeping everything else.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Response<U>, E> {
        let data = self.data.map(f).transpose()?;
        Ok(Response {
            status: self.status,
            data,
            message: self.message,
            timestamp: self.timestamp,
            errors: self.errors,
        })
    }

    /// Transform the data, keeping everything else.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            data: self.data.map(f),
            message: self.message,
            timestamp: self.timestamp,
            errors: self.errors,
        }
    }
}

impl Response<serde_json::Value> {
    /// Typed view of an untyped reply.
    ///
    /// Data that does not decode into `U` turns the reply into a 400 failure
    /// carrying the decode error.
    pub fn decode<U: DeserializeOwned>(self) -> Response<U> {
        let Response {
            status,
            data,
            message,
            timestamp,
            errors,
        } = self;

        let data = match data {
            // `()` and `Option<_>` replies legitimately carry null
            None if status.is_success() => serde_json::from_value::<U>(serde_json::Value::Null).ok(),
            None => None,
            Some(value) => match serde_json::from_value::<U>(value) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    return Response::bad_request(format!("Malformed reply data: {}", e));
                }
            },
        };

        Response {
            status,
            data,
            message,
            timestamp,
            errors,
        }
    }
}
