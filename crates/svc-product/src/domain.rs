//! Product entity and service errors.

use crate::ports::RepositoryError;
use serde::{Deserialize, Serialize};
use shared_rpc::RpcError;
use shared_types::{ProductSummary, Response};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: u64,
    pub owner_id: String,
}

impl Product {
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            price_cents: self.price_cents,
            owner_id: self.owner_id.clone(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product {0} not found")]
    NotFound(String),

    #[error("User {user_id} does not own product {product_id}")]
    Forbidden { product_id: String, user_id: String },

    #[error("{0}")]
    Invalid(String),

    /// The media service did not confirm the cascade delete. The product is
    /// already gone; its media may linger.
    #[error("Media cleanup failed ({}): {}", .0.status(), .0.message())]
    Media(Response<()>),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
