//! Shared fixtures for the integration suite.

use async_trait::async_trait;
use serde_json::Value;
use shared_bus::InMemoryBroker;
use shared_rpc::{HandlerError, RpcConfig, RpcEndpoint, RpcHandler};
use shared_types::Response;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Replies with whatever it was sent, after an optional delay.
pub struct Echo {
    pub delay: Duration,
}

impl Echo {
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn after(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RpcHandler for Echo {
    type Request = Value;
    type Reply = Value;

    async fn handle(&self, request: Value) -> Result<Response<Value>, HandlerError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Response::ok(request))
    }
}

/// A caller endpoint and a callee endpoint on one broker.
pub struct Pair {
    pub broker: Arc<InMemoryBroker>,
    pub caller: RpcEndpoint<InMemoryBroker>,
    pub callee: RpcEndpoint<InMemoryBroker>,
}

/// Wire `handler` behind the `product-lookup` topics and have the caller
/// listen for its replies.
pub fn pair<H: RpcHandler>(handler: H) -> Pair {
    let broker = Arc::new(InMemoryBroker::new());

    let mut callee = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("callee"));
    let topics = callee.config().topics.clone();
    callee
        .serve(&topics.product_lookup, Arc::new(handler))
        .expect("serve");

    let mut caller = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("caller"));
    caller
        .listen_replies(&topics.product_lookup)
        .expect("listen");

    Pair {
        broker,
        caller,
        callee,
    }
}

impl Pair {
    pub fn request_topic(&self) -> String {
        self.caller.config().topics.product_lookup.request.clone()
    }

    pub fn reply_topic(&self) -> String {
        self.caller.config().topics.product_lookup.reply.clone()
    }
}

pub fn count(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::SeqCst)
}
