//! # Shared Types Crate
//!
//! Wire-level shapes shared by every request/reply exchange on the bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Response<T>` is the only type that carries
//!   failures across a service boundary. Nothing else crosses the bus.
//! - **Correlation in metadata**: the correlation id and the source tag travel
//!   as message headers, never inside the body.
//! - **Construct or refuse**: a `StatusCode` or `Response<T>` that violates the
//!   status invariants cannot be built or decoded.

pub mod contracts;
pub mod correlation;
pub mod envelope;
pub mod errors;
pub mod service;
pub mod status;

pub use contracts::{
    CascadeDeleteResult, Identity, OwnershipQuery, ProductIds, ProductLookup, ProductSummary, Role,
};
pub use correlation::CorrelationId;
pub use envelope::{RequestEnvelope, Response};
pub use errors::EnvelopeError;
pub use service::ServiceName;
pub use status::{is_error, is_success, StatusCode};

/// Message header carrying the correlation id of a request/reply pair.
pub const CORRELATION_ID_HEADER: &str = "correlation-id";

/// Message header naming the service that produced a message.
///
/// Diagnostics only. Never used for routing or trust decisions.
pub const SOURCE_SERVICE_HEADER: &str = "source-service";
