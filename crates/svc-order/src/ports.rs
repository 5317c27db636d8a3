//! # Outbound Ports

use crate::domain::Order;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Order repository unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, RepositoryError>;

    /// Orders placed by `user_id`, oldest first.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError>;
}
