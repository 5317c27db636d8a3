//! Reply Dispatcher - routes reply messages to waiting callers.
//!
//! Routing is purely by the correlation header, so one dispatcher serves any
//! number of concurrent calls, in any order.

use crate::pending::{CorrelationRegistry, Reply};
use mesh_telemetry::record_late_reply;
use shared_bus::{BusMessage, MessageStream};
use shared_types::{CorrelationId, Response};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to one reply message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the waiting caller.
    Delivered,
    /// Nobody was waiting (late or unknown reply).
    Discarded,
    /// Missing or unparseable correlation header; dropped.
    Uncorrelated,
}

/// Route one reply message into the registry.
///
/// A body that does not decode as a reply envelope still unblocks the caller
/// with a 400 carrying the decode error.
pub fn dispatch_reply(registry: &CorrelationRegistry, message: &BusMessage) -> DispatchOutcome {
    let Some(raw_id) = message.correlation_id() else {
        warn!(
            topic = %message.topic,
            source = message.source().unwrap_or("-"),
            "Reply without correlation id dropped"
        );
        return DispatchOutcome::Uncorrelated;
    };

    let correlation_id = match CorrelationId::parse(raw_id) {
        Ok(id) => id,
        Err(e) => {
            warn!(
                topic = %message.topic,
                correlation_id = raw_id,
                error = %e,
                "Reply with unparseable correlation id dropped"
            );
            return DispatchOutcome::Uncorrelated;
        }
    };

    let reply: Reply = match serde_json::from_slice(&message.body) {
        Ok(reply) => reply,
        Err(e) => {
            warn!(
                topic = %message.topic,
                correlation_id = %correlation_id,
                error = %e,
                "Malformed reply body"
            );
            Response::bad_request(e.to_string())
        }
    };

    if registry.resolve(correlation_id, reply) {
        debug!(
            topic = %message.topic,
            correlation_id = %correlation_id,
            "Reply delivered"
        );
        DispatchOutcome::Delivered
    } else {
        record_late_reply();
        warn!(
            topic = %message.topic,
            correlation_id = %correlation_id,
            "Late or unknown reply discarded"
        );
        DispatchOutcome::Discarded
    }
}

/// Long-lived consumer of one reply subscription.
pub struct ReplyDispatcher<S> {
    registry: Arc<CorrelationRegistry>,
    stream: S,
    topic: String,
}

impl<S: MessageStream + 'static> ReplyDispatcher<S> {
    pub fn new(registry: Arc<CorrelationRegistry>, stream: S, topic: impl Into<String>) -> Self {
        Self {
            registry,
            stream,
            topic: topic.into(),
        }
    }

    /// Consume replies until the subscription ends.
    pub async fn run(mut self) {
        info!(topic = %self.topic, "Reply dispatcher started");
        while let Some(message) = self.stream.next_message().await {
            dispatch_reply(&self.registry, &message);
        }
        info!(topic = %self.topic, "Reply dispatcher stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
