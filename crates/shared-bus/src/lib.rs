//! # Shared Bus - Message Broker for Inter-Service Communication
//!
//! Services never call each other directly. Every exchange is a message
//! published to a topic and consumed by whoever subscribed to it.
//!
//! ## Architecture Rules
//!
//! - All inter-service communication goes through the bus
//! - Correlation id and source tag travel as message headers
//! - Consumer groups decide delivery: members of one group compete for a
//!   message, distinct groups each get a copy
//!
//! ```text
//! ┌──────────────┐                       ┌──────────────┐
//! │  Service A   │  publish(topic, msg)  │  Service B   │
//! │              │ ──────┐               │  (group "b") │
//! └──────────────┘       │               └──────────────┘
//!                        ▼                       ↑
//!                  ┌──────────────┐              │
//!                  │    Broker    │ ─────────────┘
//!                  │  topic→group │  subscribe(topic, group)
//!                  └──────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod message;
pub mod publisher;
pub mod subscriber;
pub mod topics;

use thiserror::Error;

// Re-export main types
pub use message::BusMessage;
pub use publisher::{InMemoryBroker, MessagePublisher};
pub use subscriber::{MessageStream, MessageSubscriber, Subscription};
pub use topics::{TopicCatalog, TopicPair};

/// Maximum messages buffered per consumer group before publishes are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Transport-level failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The broker was shut down or is unreachable.
    #[error("Broker closed")]
    Closed,

    /// Topic name is empty or otherwise unusable.
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    /// Payload could not be encoded into a message body.
    #[error("Encoding failed: {0}")]
    Encode(String),
}
