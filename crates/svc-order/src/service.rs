//! Order placement.

use crate::domain::{Order, OrderError, OrderLine};
use crate::ports::OrderRepository;
use shared_bus::TopicPair;
use shared_rpc::RpcClient;
use shared_types::{ProductIds, ProductLookup, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    client: RpcClient,
    product_lookup: TopicPair,
    lookup_timeout: Duration,
}

impl OrderService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        client: RpcClient,
        product_lookup: TopicPair,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            client,
            product_lookup,
            lookup_timeout,
        }
    }

    /// Place an order for `product_ids`, priced by the product service.
    ///
    /// Duplicate ids are ordered once. Any id the product service does not
    /// know fails the whole order.
    pub async fn create_order(
        &self,
        user_id: &str,
        product_ids: Vec<String>,
    ) -> Result<Order, OrderError> {
        if user_id.trim().is_empty() {
            return Err(OrderError::Invalid("user id cannot be empty".into()));
        }
        let ids = ProductIds::from(product_ids).into_vec();
        if ids.is_empty() {
            return Err(OrderError::Invalid(
                "an order needs at least one product".into(),
            ));
        }

        let reply: Response<ProductLookup> = self
            .client
            .call_pair(&self.product_lookup, &ids, self.lookup_timeout)
            .await?;

        let lookup = match reply.into_result() {
            Ok(lookup) => lookup.unwrap_or_default(),
            Err(failure) => {
                warn!(
                    user_id = user_id,
                    status = %failure.status(),
                    message = failure.message(),
                    "Product lookup failed"
                );
                return Err(OrderError::ProductService(failure));
            }
        };
        if !lookup.missing.is_empty() {
            return Err(OrderError::UnknownProducts(lookup.missing));
        }

        let order = Order::new(
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            lookup.found.into_iter().map(OrderLine::from).collect(),
        );
        self.repository.insert(order.clone()).await?;

        info!(
            order_id = %order.id,
            user_id = user_id,
            lines = order.lines.len(),
            total_cents = order.total_cents,
            "Order created"
        );
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        Ok(self.repository.find_by_user(user_id).await?)
    }
}
