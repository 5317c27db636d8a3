//! # Order Service
//!
//! Places orders. Product names and prices are never trusted from the
//! client; they come from the product service over `product-lookup`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryOrderRepository;
pub use domain::{Order, OrderError, OrderLine};
pub use ports::{OrderRepository, RepositoryError};
pub use service::OrderService;

use shared_bus::{BusError, MessagePublisher, MessageSubscriber};
use shared_rpc::RpcEndpoint;

/// Listen for product lookup replies. The order service serves no topics.
pub fn serve<B>(endpoint: &mut RpcEndpoint<B>) -> Result<(), BusError>
where
    B: MessagePublisher + MessageSubscriber + 'static,
{
    let topics = endpoint.config().topics.clone();
    endpoint.listen_replies(&topics.product_lookup)
}
