//! # Outbound Ports

use crate::domain::Media;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Media repository unavailable: {0}")]
    Unavailable(String),
}

/// Media persistence.
///
/// Deletes are by id and naturally idempotent.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn insert(&self, media: Media) -> Result<(), RepositoryError>;

    async fn find_by_product(&self, product_id: &str) -> Result<Vec<Media>, RepositoryError>;

    /// Delete every row referencing one of `product_ids`.
    ///
    /// Returns the ids of the rows removed; unknown product ids contribute
    /// nothing.
    async fn delete_by_product_ids(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<String>, RepositoryError>;
}
