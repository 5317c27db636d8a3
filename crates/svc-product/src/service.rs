//! Product service: catalogue writes and the cascading delete.

use crate::domain::{Product, ProductError};
use crate::ports::ProductRepository;
use shared_bus::TopicPair;
use shared_rpc::RpcClient;
use shared_types::{CascadeDeleteResult, ProductIds, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    client: RpcClient,
    cascade_delete: TopicPair,
    cascade_timeout: Duration,
}

impl ProductService {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        client: RpcClient,
        cascade_delete: TopicPair,
        cascade_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            client,
            cascade_delete,
            cascade_timeout,
        }
    }

    pub async fn create_product(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
        price_cents: u64,
    ) -> Result<Product, ProductError> {
        if owner_id.trim().is_empty() {
            return Err(ProductError::Invalid("owner id cannot be empty".into()));
        }
        if name.trim().is_empty() {
            return Err(ProductError::Invalid("product name cannot be empty".into()));
        }

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            price_cents,
            owner_id: owner_id.to_string(),
        };
        self.repository.insert(product.clone()).await?;

        info!(product_id = %product.id, owner_id = owner_id, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, ProductError> {
        self.repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ProductError::NotFound(product_id.to_string()))
    }

    /// Delete a product owned by `user_id`, then ask the media service to
    /// drop its media.
    ///
    /// The product is removed before the cascade call; a failed or timed out
    /// cascade is reported but does not restore it.
    pub async fn delete_product(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<CascadeDeleteResult, ProductError> {
        let product = self.get_product(product_id).await?;
        if !product.is_owned_by(user_id) {
            return Err(ProductError::Forbidden {
                product_id: product_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        if !self.repository.delete(product_id).await? {
            return Err(ProductError::NotFound(product_id.to_string()));
        }
        info!(product_id = product_id, "Product deleted");

        let ids = ProductIds::One(product_id.to_string());
        let reply: Response<CascadeDeleteResult> = self
            .client
            .call_pair(&self.cascade_delete, &ids, self.cascade_timeout)
            .await?;

        match reply.into_result() {
            Ok(result) => {
                let result = result.unwrap_or_default();
                info!(
                    product_id = product_id,
                    media_deleted = result.count,
                    "Cascade delete confirmed"
                );
                Ok(result)
            }
            Err(failure) => {
                error!(
                    product_id = product_id,
                    status = %failure.status(),
                    message = failure.message(),
                    "Cascade delete failed"
                );
                Err(ProductError::Media(failure))
            }
        }
    }
}
