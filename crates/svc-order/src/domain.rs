//! Order entity and service errors.

use crate::ports::RepositoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_rpc::RpcError;
use shared_types::{ProductSummary, Response};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub price_cents: u64,
}

impl From<ProductSummary> for OrderLine {
    fn from(product: ProductSummary) -> Self {
        Self {
            product_id: product.id,
            name: product.name,
            price_cents: product.price_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<OrderLine>,
    pub total_cents: u64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: String, user_id: String, lines: Vec<OrderLine>) -> Self {
        let total_cents = lines.iter().map(|l| l.price_cents).sum();
        Self {
            id,
            user_id,
            lines,
            total_cents,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    Invalid(String),

    /// Ids the product service does not know.
    #[error("Unknown products: {}", .0.join(", "))]
    UnknownProducts(Vec<String>),

    /// The product service answered with an error status (timeouts included).
    #[error("Product lookup failed ({}): {}", .0.status(), .0.message())]
    ProductService(Response<()>),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
