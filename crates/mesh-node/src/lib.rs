//! # Marketplace Mesh Node
//!
//! Runs the user, product, media, order and gateway services in one process.
//! Services share nothing but the broker: every cross-service call is a
//! request/reply exchange over the bus.
//!
//! ```text
//!            HTTP
//!             │
//!   ┌─────────▼─────────┐  identity-validation   ┌──────────┐
//!   │      gateway      │ ─────────────────────► │   user   │
//!   └─────────┬─────────┘                        └──────────┘
//!             │ routes
//!   ┌─────────▼─────────┐  cascade-delete        ┌──────────┐
//!   │      product      │ ─────────────────────► │  media   │
//!   │                   │ ◄───────────────────── │          │
//!   └─────────▲─────────┘  ownership-check       └──────────┘
//!             │ product-lookup
//!   ┌─────────┴─────────┐
//!   │       order       │
//!   └───────────────────┘
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`MESH_CONFIG` file, then environment)
//! 2. Initialize logging and metrics
//! 3. Start every service endpoint on the shared broker
//! 4. Serve HTTP until Ctrl+C, then shut the broker down

pub mod config;
pub mod container;
pub mod routes;

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tracing::info;

pub use config::{NodeConfig, SeedIdentity};
pub use container::{AppState, ServiceContainer};

/// The running node.
pub struct MeshNode {
    container: ServiceContainer,
}

impl MeshNode {
    /// Start every service. Must run inside a tokio runtime.
    pub fn start(config: NodeConfig) -> Result<Self> {
        info!(
            bind_addr = %config.gateway.bind_addr,
            identities = config.identities.len(),
            "Starting marketplace mesh node"
        );
        Ok(Self {
            container: ServiceContainer::new(config)?,
        })
    }

    /// HTTP router for the gateway.
    pub fn router(&self) -> Router {
        routes::router(
            self.container.state.clone(),
            self.container.access.clone(),
        )
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    pub fn broker(&self) -> Arc<shared_bus::InMemoryBroker> {
        Arc::clone(&self.container.broker)
    }

    pub fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        self.container.shutdown();
        info!("Shutdown complete");
    }
}
