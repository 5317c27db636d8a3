//! Media service: attaching media after an ownership check.

use crate::domain::{Media, MediaError};
use crate::ports::MediaRepository;
use shared_bus::TopicPair;
use shared_rpc::RpcClient;
use shared_types::{OwnershipQuery, ProductSummary, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub struct MediaService {
    repository: Arc<dyn MediaRepository>,
    client: RpcClient,
    ownership: TopicPair,
    ownership_timeout: Duration,
}

impl MediaService {
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        client: RpcClient,
        ownership: TopicPair,
        ownership_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            client,
            ownership,
            ownership_timeout,
        }
    }

    /// Attach a file to a product owned by `user_id`.
    ///
    /// The product service decides ownership; its refusal comes back as
    /// [`MediaError::Ownership`] carrying the reply status and message.
    pub async fn attach_media(
        &self,
        user_id: &str,
        product_id: &str,
        file_name: &str,
    ) -> Result<Media, MediaError> {
        if file_name.trim().is_empty() {
            return Err(MediaError::Invalid("file name cannot be empty".into()));
        }

        let query = OwnershipQuery {
            product_id: product_id.to_string(),
            user_id: user_id.to_string(),
        };
        let reply: Response<ProductSummary> = self
            .client
            .call_pair(&self.ownership, &query, self.ownership_timeout)
            .await?;

        if let Err(failure) = reply.into_result() {
            warn!(
                product_id = product_id,
                user_id = user_id,
                status = %failure.status(),
                "Ownership check refused"
            );
            return Err(MediaError::Ownership(failure));
        }

        let media = Media {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            file_name: file_name.trim().to_string(),
        };
        self.repository.insert(media.clone()).await?;

        info!(media_id = %media.id, product_id = product_id, "Media attached");
        Ok(media)
    }

    pub async fn media_for_product(&self, product_id: &str) -> Result<Vec<Media>, MediaError> {
        Ok(self.repository.find_by_product(product_id).await?)
    }
}
