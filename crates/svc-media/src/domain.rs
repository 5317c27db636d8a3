//! Media entity and service errors.

use crate::ports::RepositoryError;
use serde::{Deserialize, Serialize};
use shared_rpc::RpcError;
use shared_types::Response;
use thiserror::Error;

/// A file attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub product_id: String,
    pub file_name: String,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Invalid(String),

    /// The product service refused: not the owner, unknown product, or a
    /// timeout. Carries the reply as received.
    #[error("Ownership check failed ({}): {}", .0.status(), .0.message())]
    Ownership(Response<()>),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
