//! RPC handlers for product lookups and ownership checks.

use crate::ports::ProductRepository;
use async_trait::async_trait;
use shared_rpc::{HandlerError, RpcHandler};
use shared_types::{OwnershipQuery, ProductIds, ProductLookup, ProductSummary, Response};
use std::sync::Arc;
use tracing::debug;

/// Answers `product-lookup`: found products plus the ids that matched
/// nothing. Always 200 for a well-formed request.
pub struct ProductLookupHandler {
    repository: Arc<dyn ProductRepository>,
}

impl ProductLookupHandler {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RpcHandler for ProductLookupHandler {
    type Request = ProductIds;
    type Reply = ProductLookup;

    async fn handle(&self, request: ProductIds) -> Result<Response<ProductLookup>, HandlerError> {
        let ids = request.into_vec();
        if ids.is_empty() {
            return Err(HandlerError::invalid("At least one product id is required"));
        }

        let found: Vec<ProductSummary> = self
            .repository
            .find_by_ids(&ids)
            .await
            .map_err(|e| HandlerError::Internal(e.to_string()))?
            .iter()
            .map(|p| p.summary())
            .collect();
        let missing = ids
            .into_iter()
            .filter(|id| !found.iter().any(|p| &p.id == id))
            .collect();

        Ok(Response::ok(ProductLookup { found, missing }))
    }
}

/// Answers `ownership-check`: 200 with the product if `user_id` owns it,
/// 403 if someone else does, 404 if it does not exist.
pub struct OwnershipCheckHandler {
    repository: Arc<dyn ProductRepository>,
}

impl OwnershipCheckHandler {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RpcHandler for OwnershipCheckHandler {
    type Request = OwnershipQuery;
    type Reply = ProductSummary;

    async fn handle(&self, query: OwnershipQuery) -> Result<Response<ProductSummary>, HandlerError> {
        let mut errors = Vec::new();
        if query.product_id.trim().is_empty() {
            errors.push("product_id is required".to_string());
        }
        if query.user_id.trim().is_empty() {
            errors.push("user_id is required".to_string());
        }
        if !errors.is_empty() {
            return Err(HandlerError::Invalid {
                message: "Validation failed".into(),
                errors,
            });
        }

        let product = self
            .repository
            .find_by_id(&query.product_id)
            .await
            .map_err(|e| HandlerError::Internal(e.to_string()))?
            .ok_or_else(|| HandlerError::NotFound("Product not found".into()))?;

        if !product.is_owned_by(&query.user_id) {
            debug!(
                product_id = %query.product_id,
                user_id = %query.user_id,
                "Ownership denied"
            );
            return Err(HandlerError::Forbidden(
                "You do not own this product".into(),
            ));
        }

        Ok(Response::ok(product.summary()).with_message("Ownership confirmed"))
    }
}
