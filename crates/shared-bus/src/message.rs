//! # Bus Messages
//!
//! A message is a topic, a set of string headers and an opaque body.

use crate::BusError;
use bytes::Bytes;
use serde::Serialize;
use shared_types::{
    CorrelationId, RequestEnvelope, Response, CORRELATION_ID_HEADER, SOURCE_SERVICE_HEADER,
};
use std::collections::BTreeMap;

/// A single message on the bus.
///
/// Header names are case-insensitive; they are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// Metadata. Never carries business data.
    pub headers: BTreeMap<String, String>,
    /// Opaque body, JSON for every message this workspace produces.
    pub body: Bytes,
}

impl BusMessage {
    /// Create a message with no headers.
    pub fn new(topic: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Create a message whose body is the JSON encoding of `value`.
    pub fn json<T: Serialize + ?Sized>(topic: impl Into<String>, value: &T) -> Result<Self, BusError> {
        let body = serde_json::to_vec(value).map_err(|e| BusError::Encode(e.to_string()))?;
        Ok(Self::new(topic, body))
    }

    /// Turn a request envelope into the message that carries it.
    pub fn from_request(request: &RequestEnvelope) -> Result<Self, BusError> {
        Ok(Self::json(&request.topic, &request.payload)?
            .with_correlation_id(request.correlation_id)
            .with_source(&request.source_tag))
    }

    /// Build a reply message echoing the request's correlation header verbatim.
    pub fn reply<T: Serialize>(
        topic: impl Into<String>,
        correlation_id: &str,
        source: &str,
        response: &Response<T>,
    ) -> Result<Self, BusError> {
        Ok(Self::json(topic, response)?
            .with_header(CORRELATION_ID_HEADER, correlation_id)
            .with_source(source))
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_correlation_id(self, id: CorrelationId) -> Self {
        self.with_header(CORRELATION_ID_HEADER, id.to_string())
    }

    #[must_use]
    pub fn with_source(self, source: &str) -> Self {
        self.with_header(SOURCE_SERVICE_HEADER, source)
    }

    /// Look up a header by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw correlation header, if present and non-empty.
    pub fn correlation_id(&self) -> Option<&str> {
        self.header(CORRELATION_ID_HEADER)
            .filter(|value| !value.trim().is_empty())
    }

    /// Source service tag, if present.
    pub fn source(&self) -> Option<&str> {
        self.header(SOURCE_SERVICE_HEADER)
    }
}
