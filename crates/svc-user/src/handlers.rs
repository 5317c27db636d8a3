//! Identity validation handler.

use crate::ports::IdentityStore;
use async_trait::async_trait;
use shared_rpc::{HandlerError, RpcHandler};
use shared_types::{Identity, Response};
use std::sync::Arc;
use tracing::debug;

/// Extract the token from an `Authorization` value.
///
/// The scheme is case-insensitive; anything but a non-empty bearer token is
/// `None`.
pub fn parse_bearer(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Answers `identity-validation` requests.
///
/// Request: the raw `Authorization` header value. Reply: the caller's
/// [`Identity`], or 401.
pub struct ValidateAccessHandler {
    store: Arc<dyn IdentityStore>,
}

impl ValidateAccessHandler {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RpcHandler for ValidateAccessHandler {
    type Request = String;
    type Reply = Identity;

    async fn handle(&self, authorization: String) -> Result<Response<Identity>, HandlerError> {
        let token = parse_bearer(&authorization).ok_or_else(|| {
            HandlerError::Unauthorized("Missing or malformed bearer token".into())
        })?;

        let identity = self
            .store
            .find_by_token(token)
            .await
            .map_err(|e| HandlerError::Internal(e.to_string()))?
            .ok_or_else(|| HandlerError::Unauthorized("Invalid or expired token".into()))?;

        debug!(user_id = %identity.user_id, role = %identity.role, "Token validated");
        Ok(Response::ok(identity).with_message("Token is valid"))
    }
}
