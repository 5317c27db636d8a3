//! # Outbound Ports

use crate::domain::Product;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Product repository unavailable: {0}")]
    Unavailable(String),
}

/// Product persistence.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: Product) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError>;

    /// Products for the ids that exist, in request order.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, RepositoryError>;

    /// Returns whether a product was removed.
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;
}
