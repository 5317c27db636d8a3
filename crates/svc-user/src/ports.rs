//! # Outbound Ports
//!
//! Storage the user service depends on. Token issuance and password
//! hashing live behind this port.

use async_trait::async_trait;
use shared_types::Identity;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Identity store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup of the identity a token was issued to.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// `Ok(None)` for unknown, revoked or expired tokens.
    async fn find_by_token(&self, token: &str) -> Result<Option<Identity>, StoreError>;
}
