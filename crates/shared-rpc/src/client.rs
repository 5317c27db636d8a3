//! RPC Client - publish a request and wait for its correlated reply.

use crate::error::RpcError;
use crate::pending::{CorrelationRegistry, PendingCallGuard, Reply};
use mesh_telemetry::{record_rpc_call, CallOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_bus::{BusMessage, MessagePublisher, TopicPair};
use shared_types::{RequestEnvelope, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Caller-facing half of the bridge.
///
/// One client per service, shared by every call site; the timeout is a
/// per-call argument.
#[derive(Clone)]
pub struct RpcClient {
    registry: Arc<CorrelationRegistry>,
    publisher: Arc<dyn MessagePublisher>,
    source: String,
    default_timeout: Duration,
}

impl RpcClient {
    pub fn new(
        registry: Arc<CorrelationRegistry>,
        publisher: Arc<dyn MessagePublisher>,
        source: impl Into<String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            publisher,
            source: source.into(),
            default_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Call `topic` with a typed payload and reply.
    ///
    /// Callee-declared failures and timeouts come back as `Ok(response)` with
    /// an error status. Reply data that does not fit `T` becomes a 400.
    pub async fn call<P, T>(
        &self,
        topic: &str,
        payload: &P,
        timeout: Duration,
    ) -> Result<Response<T>, RpcError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(payload).map_err(|e| RpcError::Encode(e.to_string()))?;
        Ok(self.call_raw(topic, payload, timeout).await?.decode())
    }

    /// [`call`](Self::call) with the client's default timeout.
    pub async fn call_default<P, T>(&self, topic: &str, payload: &P) -> Result<Response<T>, RpcError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(topic, payload, self.default_timeout).await
    }

    /// [`call`](Self::call) on the request side of a topic pair.
    pub async fn call_pair<P, T>(
        &self,
        pair: &TopicPair,
        payload: &P,
        timeout: Duration,
    ) -> Result<Response<T>, RpcError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(&pair.request, payload, timeout).await
    }

    /// Untyped call; the reply is returned as received.
    pub async fn call_raw(
        &self,
        topic: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Reply, RpcError> {
        if topic.trim().is_empty() {
            return Err(RpcError::InvalidArgument("target topic cannot be empty".into()));
        }
        if timeout.is_zero() {
            return Err(RpcError::InvalidArgument(
                "timeout must be greater than zero".into(),
            ));
        }

        let started = Instant::now();
        let (correlation_id, mut rx) = self.registry.register(topic, timeout);
        let guard = PendingCallGuard::new(&self.registry, correlation_id);

        let request = RequestEnvelope::new(topic, payload, correlation_id, &self.source)?;
        let message =
            BusMessage::from_request(&request).map_err(|e| RpcError::Encode(e.to_string()))?;

        if let Err(e) = self.publisher.publish(message).await {
            // Guard drop removes the entry
            drop(guard);
            record_rpc_call(topic, CallOutcome::Transport, started.elapsed());
            error!(
                topic = topic,
                correlation_id = %correlation_id,
                error = %e,
                "Failed to publish request"
            );
            return Err(RpcError::Transport(e));
        }

        debug!(
            topic = topic,
            correlation_id = %correlation_id,
            source = %self.source,
            timeout_ms = timeout.as_millis(),
            "Sent request"
        );

        let (reply, outcome) = match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(reply)) => (reply, CallOutcome::Reply),
            // Slot closed without a value: swept after the deadline
            Ok(Err(_)) => (
                Response::timeout(topic, started.elapsed()),
                CallOutcome::Timeout,
            ),
            Err(_) => {
                if self.registry.expire(&correlation_id) {
                    warn!(
                        topic = topic,
                        correlation_id = %correlation_id,
                        timeout_ms = timeout.as_millis(),
                        "Request timed out"
                    );
                    (
                        Response::timeout(topic, started.elapsed()),
                        CallOutcome::Timeout,
                    )
                } else {
                    // A reply won the race; it is already in the slot
                    match rx.await {
                        Ok(reply) => (reply, CallOutcome::Reply),
                        Err(_) => (
                            Response::timeout(topic, started.elapsed()),
                            CallOutcome::Timeout,
                        ),
                    }
                }
            }
        };
        guard.disarm();

        record_rpc_call(topic, outcome, started.elapsed());
        Ok(reply)
    }
}
