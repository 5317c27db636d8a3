//! Per-service wiring of the RPC pieces.
//!
//! An endpoint owns one registry and one client, and spawns the dispatcher,
//! server and cleanup tasks a service needs on a shared broker.

use crate::client::RpcClient;
use crate::config::RpcConfig;
use crate::dispatcher::ReplyDispatcher;
use crate::pending::{cleanup_task, CorrelationRegistry};
use crate::server::{RpcHandler, RpcServer};
use shared_bus::{BusError, MessagePublisher, MessageSubscriber, TopicPair};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

pub struct RpcEndpoint<B> {
    broker: Arc<B>,
    config: RpcConfig,
    registry: Arc<CorrelationRegistry>,
    client: RpcClient,
    /// Reply subscriptions use a group of their own per instance, so every
    /// instance sees every reply and resolves only its own.
    reply_group: String,
    tasks: Vec<JoinHandle<()>>,
}

impl<B> RpcEndpoint<B>
where
    B: MessagePublisher + MessageSubscriber + 'static,
{
    pub fn new(broker: Arc<B>, config: RpcConfig) -> Self {
        let registry = Arc::new(CorrelationRegistry::new());
        let client = RpcClient::new(
            Arc::clone(&registry),
            Arc::clone(&broker) as Arc<dyn MessagePublisher>,
            config.source.clone(),
            config.timeouts.default,
        );
        let reply_group = format!("{}-{}", config.consumer_group, Uuid::new_v4());

        Self {
            broker,
            config,
            registry,
            client,
            reply_group,
            tasks: Vec::new(),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Start routing replies arriving on `pair.reply` into the registry.
    pub fn listen_replies(&mut self, pair: &TopicPair) -> Result<(), BusError> {
        let stream = self.broker.subscribe(&pair.reply, &self.reply_group)?;
        let handle = ReplyDispatcher::new(Arc::clone(&self.registry), stream, &pair.reply).spawn();
        self.tasks.push(handle);
        Ok(())
    }

    /// Answer requests on `pair.request` with `handler`, replying on
    /// `pair.reply`.
    ///
    /// Instances sharing the consumer group split the requests between them.
    pub fn serve<H: RpcHandler>(&mut self, pair: &TopicPair, handler: Arc<H>) -> Result<(), BusError> {
        let stream = self
            .broker
            .subscribe(&pair.request, &self.config.consumer_group)?;
        let handle = RpcServer::new(
            handler,
            stream,
            Arc::clone(&self.broker) as Arc<dyn MessagePublisher>,
            &pair.reply,
            &self.config.source,
        )
        .with_max_in_flight(self.config.max_in_flight)
        .spawn();
        self.tasks.push(handle);
        Ok(())
    }

    /// Sweep abandoned registry entries every `cleanup_interval`.
    pub fn start_cleanup(&mut self) {
        let handle = tokio::spawn(cleanup_task(
            Arc::clone(&self.registry),
            self.config.timeouts.cleanup_interval,
        ));
        self.tasks.push(handle);
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stop every task this endpoint spawned.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!(
            source = %self.config.source,
            tasks = self.tasks.len(),
            "RPC endpoint shut down"
        );
    }
}
