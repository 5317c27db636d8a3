//! # Product Service
//!
//! Owns the product catalogue.
//!
//! - Answers `product-lookup` (order service) and `ownership-check` (media
//!   service)
//! - Deleting a product calls `cascade-delete` on the media service

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod service;

pub use adapters::InMemoryProductRepository;
pub use domain::{Product, ProductError};
pub use handlers::{OwnershipCheckHandler, ProductLookupHandler};
pub use ports::{ProductRepository, RepositoryError};
pub use service::ProductService;

use shared_bus::{BusError, MessagePublisher, MessageSubscriber};
use shared_rpc::RpcEndpoint;
use std::sync::Arc;

/// Serve lookups and ownership checks, and listen for cascade-delete replies.
pub fn serve<B>(
    endpoint: &mut RpcEndpoint<B>,
    repository: Arc<dyn ProductRepository>,
) -> Result<(), BusError>
where
    B: MessagePublisher + MessageSubscriber + 'static,
{
    let topics = endpoint.config().topics.clone();
    endpoint.serve(
        &topics.product_lookup,
        Arc::new(ProductLookupHandler::new(Arc::clone(&repository))),
    )?;
    endpoint.serve(
        &topics.ownership_check,
        Arc::new(OwnershipCheckHandler::new(repository)),
    )?;
    endpoint.listen_replies(&topics.cascade_delete)
}
