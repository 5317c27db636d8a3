//! # RPC Server Handler
//!
//! Service-side half of the bridge. Each `RpcServer` drives one request
//! subscription: for every message it normalizes the payload, runs the
//! handler, and publishes exactly one reply on the reply topic carrying the
//! request's correlation header verbatim.
//!
//! ```text
//! <op>-request ──► RpcServer ──► normalize ──► decode ──► RpcHandler::handle
//!                                                              │
//! <op>-reply   ◄── reply (echoed correlation-id) ◄─────────────┘
//! ```
//!
//! Handler errors and panics are turned into error replies here; nothing a
//! handler does can stop the consumer loop or leave the caller waiting.

use crate::error::HandlerError;
use crate::payload::normalize_payload;
use async_trait::async_trait;
use futures::FutureExt;
use mesh_telemetry::record_handler_error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_bus::{BusMessage, MessagePublisher, MessageStream};
use shared_types::Response;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Requests a server handles concurrently unless configured otherwise.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 256;

/// Business logic behind one request topic.
///
/// Handlers may see the same request more than once under broker
/// redelivery and should be idempotent.
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    /// Decoded from the normalized payload.
    type Request: DeserializeOwned + Send;
    /// Carried as `data` of a success reply.
    type Reply: Serialize + Send;

    async fn handle(&self, request: Self::Request) -> Result<Response<Self::Reply>, HandlerError>;
}

/// Run one request through a handler and produce its reply.
///
/// Never fails: decode errors become 400, handler errors their mapped
/// status, panics 500.
pub async fn process_request<H: RpcHandler + ?Sized>(
    handler: &H,
    topic: &str,
    body: &[u8],
) -> Response<Value> {
    let payload = normalize_payload(body);
    let request: H::Request = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            debug!(topic = topic, error = %e, "Request payload rejected");
            return Response::validation("Invalid request payload", vec![e.to_string()]);
        }
    };

    match AssertUnwindSafe(handler.handle(request)).catch_unwind().await {
        Ok(Ok(response)) => response.try_map(serde_json::to_value).unwrap_or_else(|e| {
            record_handler_error(topic);
            error!(topic = topic, error = %e, "Failed to encode handler reply");
            Response::internal(format!("Failed to encode reply: {e}"))
        }),
        Ok(Err(e)) => {
            if matches!(e, HandlerError::Internal(_)) {
                record_handler_error(topic);
                error!(topic = topic, error = %e, "Handler failed");
            }
            e.into_response()
        }
        Err(panic) => {
            record_handler_error(topic);
            let message = panic_message(panic.as_ref());
            error!(topic = topic, panic = %message, "Handler panicked");
            Response::internal(message)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Handler panicked".to_string()
    }
}

/// Consumer loop for one request subscription.
pub struct RpcServer<H, S> {
    handler: Arc<H>,
    stream: S,
    publisher: Arc<dyn MessagePublisher>,
    reply_topic: Arc<str>,
    source: Arc<str>,
    in_flight: Arc<Semaphore>,
}

impl<H: RpcHandler, S: MessageStream + 'static> RpcServer<H, S> {
    pub fn new(
        handler: Arc<H>,
        stream: S,
        publisher: Arc<dyn MessagePublisher>,
        reply_topic: &str,
        source: &str,
    ) -> Self {
        Self {
            handler,
            stream,
            publisher,
            reply_topic: Arc::from(reply_topic),
            source: Arc::from(source),
            in_flight: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
        }
    }

    /// Cap the number of requests handled at once. At least one.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.in_flight = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// Serve requests until the subscription ends.
    ///
    /// Each request runs on its own task so a slow handler does not hold up
    /// the ones queued behind it. Once `max_in_flight` requests are running,
    /// the loop stops pulling from the subscription until one finishes.
    #[instrument(skip(self), fields(reply_topic = %self.reply_topic, source = %self.source))]
    pub async fn run(mut self) {
        info!("RPC server started");

        loop {
            let Ok(permit) = Arc::clone(&self.in_flight).acquire_owned().await else {
                break;
            };
            let Some(message) = self.stream.next_message().await else {
                break;
            };
            let Some(correlation_id) = message.correlation_id().map(str::to_owned) else {
                warn!(
                    topic = %message.topic,
                    source = message.source().unwrap_or("-"),
                    "Request without correlation id dropped"
                );
                continue;
            };

            let request = serve_one(
                Arc::clone(&self.handler),
                Arc::clone(&self.publisher),
                Arc::clone(&self.reply_topic),
                Arc::clone(&self.source),
                correlation_id,
                message,
            );
            tokio::spawn(async move {
                request.await;
                drop(permit);
            });
        }

        info!("RPC server stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

async fn serve_one<H: RpcHandler>(
    handler: Arc<H>,
    publisher: Arc<dyn MessagePublisher>,
    reply_topic: Arc<str>,
    source: Arc<str>,
    correlation_id: String,
    message: BusMessage,
) {
    debug!(
        topic = %message.topic,
        correlation_id = %correlation_id,
        caller = message.source().unwrap_or("-"),
        "Received request"
    );

    let reply = process_request(handler.as_ref(), &message.topic, &message.body).await;
    let status = reply.status();

    let outbound = match BusMessage::reply(&*reply_topic, &correlation_id, &source, &reply) {
        Ok(outbound) => outbound,
        Err(e) => {
            error!(correlation_id = %correlation_id, error = %e, "Failed to encode reply");
            return;
        }
    };

    match publisher.publish(outbound).await {
        Ok(_) => debug!(
            reply_topic = %reply_topic,
            correlation_id = %correlation_id,
            status = %status,
            "Published reply"
        ),
        Err(e) => error!(
            reply_topic = %reply_topic,
            correlation_id = %correlation_id,
            error = %e,
            "Failed to publish reply"
        ),
    }
}
