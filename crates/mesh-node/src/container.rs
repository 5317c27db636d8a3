//! # Service Container
//!
//! Builds every service on one broker. Each service gets its own
//! `RpcEndpoint`, so each has its own correlation registry and reply groups,
//! as it would in a separate process.

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use shared_bus::InMemoryBroker;
use shared_rpc::RpcEndpoint;
use shared_types::{Identity, ServiceName};
use std::sync::Arc;
use svc_gateway::AccessValidationLayer;
use svc_media::{InMemoryMediaRepository, MediaService};
use svc_order::{InMemoryOrderRepository, OrderService};
use svc_product::{InMemoryProductRepository, ProductService};
use svc_user::InMemoryIdentityStore;
use tracing::info;

/// Services reachable from HTTP routes.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub media: Arc<MediaService>,
    pub orders: Arc<OrderService>,
}

/// Owns the broker, the stores and every service endpoint.
pub struct ServiceContainer {
    pub config: NodeConfig,
    pub broker: Arc<InMemoryBroker>,
    pub identities: Arc<InMemoryIdentityStore>,
    pub products: Arc<InMemoryProductRepository>,
    pub media: Arc<InMemoryMediaRepository>,
    pub orders: Arc<InMemoryOrderRepository>,
    pub state: AppState,
    pub access: AccessValidationLayer,
    endpoints: Vec<RpcEndpoint<InMemoryBroker>>,
}

impl ServiceContainer {
    /// Start every service. Must run inside a tokio runtime.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let broker = Arc::new(InMemoryBroker::with_capacity(config.rpc.channel_capacity));
        let timeouts = config.rpc.timeouts.clone();
        let topics = config.rpc.topics.clone();

        let identities = Arc::new(InMemoryIdentityStore::new());
        for seed in &config.identities {
            identities.issue(
                seed.token.clone(),
                Identity {
                    user_id: seed.user_id.clone(),
                    role: seed.role,
                },
            );
        }
        let products = Arc::new(InMemoryProductRepository::new());
        let media = Arc::new(InMemoryMediaRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());

        let mut user = RpcEndpoint::new(Arc::clone(&broker), config.rpc_for(ServiceName::User));
        svc_user::serve(&mut user, identities.clone()).context("Failed to start user service")?;

        let mut product = RpcEndpoint::new(Arc::clone(&broker), config.rpc_for(ServiceName::Product));
        svc_product::serve(&mut product, products.clone())
            .context("Failed to start product service")?;

        let mut media_endpoint = RpcEndpoint::new(Arc::clone(&broker), config.rpc_for(ServiceName::Media));
        svc_media::serve(&mut media_endpoint, media.clone())
            .context("Failed to start media service")?;

        let mut order = RpcEndpoint::new(Arc::clone(&broker), config.rpc_for(ServiceName::Order));
        svc_order::serve(&mut order).context("Failed to start order service")?;

        let mut gateway = RpcEndpoint::new(Arc::clone(&broker), config.rpc_for(ServiceName::Gateway));
        svc_gateway::serve(&mut gateway, &config.gateway)
            .context("Failed to start gateway reply listener")?;
        let access = AccessValidationLayer::from_config(gateway.client().clone(), &config.gateway)
            .context("Invalid gateway access policy")?;

        let state = AppState {
            products: Arc::new(ProductService::new(
                products.clone(),
                product.client().clone(),
                topics.cascade_delete.clone(),
                timeouts.cascade_delete,
            )),
            media: Arc::new(MediaService::new(
                media.clone(),
                media_endpoint.client().clone(),
                topics.ownership_check.clone(),
                timeouts.ownership_check,
            )),
            orders: Arc::new(OrderService::new(
                orders.clone(),
                order.client().clone(),
                topics.product_lookup.clone(),
                timeouts.product_lookup,
            )),
        };

        let mut endpoints = vec![user, product, media_endpoint, order, gateway];
        for endpoint in &mut endpoints {
            endpoint.start_cleanup();
        }

        info!(
            services = endpoints.len(),
            identities = identities.len(),
            "Services started"
        );

        Ok(Self {
            config,
            broker,
            identities,
            products,
            media,
            orders,
            state,
            access,
            endpoints,
        })
    }

    /// Calls waiting for a reply across every service.
    pub fn pending_calls(&self) -> usize {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.registry().pending_count())
            .sum()
    }

    /// Close the broker and stop every endpoint task.
    pub fn shutdown(self) {
        self.broker.shutdown();
        for endpoint in self.endpoints {
            endpoint.shutdown();
        }
    }
}
