//! # Media Service
//!
//! Stores media attached to products.
//!
//! - Answers `cascade-delete` from the product service: every media row of
//!   the given products is removed
//! - Calls `ownership-check` on the product service before attaching media
//!   to a product

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod service;

pub use adapters::InMemoryMediaRepository;
pub use domain::{Media, MediaError};
pub use handlers::CascadeDeleteHandler;
pub use ports::{MediaRepository, RepositoryError};
pub use service::MediaService;

use shared_bus::{BusError, MessagePublisher, MessageSubscriber};
use shared_rpc::RpcEndpoint;
use std::sync::Arc;

/// Serve cascade deletes and listen for ownership-check replies.
pub fn serve<B>(
    endpoint: &mut RpcEndpoint<B>,
    repository: Arc<dyn MediaRepository>,
) -> Result<(), BusError>
where
    B: MessagePublisher + MessageSubscriber + 'static,
{
    let topics = endpoint.config().topics.clone();
    endpoint.serve(
        &topics.cascade_delete,
        Arc::new(CascadeDeleteHandler::new(repository)),
    )?;
    endpoint.listen_replies(&topics.ownership_check)
}
