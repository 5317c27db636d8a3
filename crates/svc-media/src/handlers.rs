//! Cascade delete handler.

use crate::ports::MediaRepository;
use async_trait::async_trait;
use shared_rpc::{HandlerError, RpcHandler};
use shared_types::{CascadeDeleteResult, ProductIds, Response};
use std::sync::Arc;
use tracing::info;

/// Answers `cascade-delete` requests.
///
/// Products without media are not an error: the reply is 200 with whatever
/// was deleted, possibly nothing. Safe to run twice for the same request.
pub struct CascadeDeleteHandler {
    repository: Arc<dyn MediaRepository>,
}

impl CascadeDeleteHandler {
    pub fn new(repository: Arc<dyn MediaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RpcHandler for CascadeDeleteHandler {
    type Request = ProductIds;
    type Reply = CascadeDeleteResult;

    async fn handle(
        &self,
        request: ProductIds,
    ) -> Result<Response<CascadeDeleteResult>, HandlerError> {
        let product_ids = request.into_vec();
        if product_ids.is_empty() {
            return Err(HandlerError::invalid("At least one product id is required"));
        }

        let deleted = self
            .repository
            .delete_by_product_ids(&product_ids)
            .await
            .map_err(|e| HandlerError::Internal(e.to_string()))?;

        info!(
            products = product_ids.len(),
            deleted = deleted.len(),
            "Cascade delete completed"
        );

        let count = deleted.len();
        let message = format!("Deleted {count} media item(s)");
        Ok(Response::ok(CascadeDeleteResult { deleted, count }).with_message(message))
    }
}
