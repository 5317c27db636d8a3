//! # User Service
//!
//! Owns identities and answers bearer-token validation requests for the
//! gateway.
//!
//! ## Architecture
//!
//! - **Ports** (`ports.rs`): the identity store the handler reads from
//! - **Adapters** (`adapters.rs`): in-memory store
//! - **Handlers** (`handlers.rs`): RPC handler for `identity-validation`

pub mod adapters;
pub mod handlers;
pub mod ports;

pub use adapters::InMemoryIdentityStore;
pub use handlers::{parse_bearer, ValidateAccessHandler};
pub use ports::{IdentityStore, StoreError};

use shared_bus::{BusError, MessagePublisher, MessageSubscriber};
use shared_rpc::RpcEndpoint;
use std::sync::Arc;

/// Serve identity validation on the endpoint's configured topics.
pub fn serve<B>(endpoint: &mut RpcEndpoint<B>, store: Arc<dyn IdentityStore>) -> Result<(), BusError>
where
    B: MessagePublisher + MessageSubscriber + 'static,
{
    let pair = endpoint.config().topics.identity_validation.clone();
    endpoint.serve(&pair, Arc::new(ValidateAccessHandler::new(store)))
}
