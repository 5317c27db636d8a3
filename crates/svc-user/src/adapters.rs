//! In-memory identity store.

use crate::ports::{IdentityStore, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Identity;
use std::collections::HashMap;

/// Token → identity map, for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    tokens: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `token` resolve to `identity`.
    pub fn issue(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.write().insert(token.into(), identity);
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.tokens.read().get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Role;

    #[tokio::test]
    async fn test_issue_and_revoke() {
        let store = InMemoryIdentityStore::new();
        store.issue(
            "t1",
            Identity {
                user_id: "u1".into(),
                role: Role::User,
            },
        );

        assert_eq!(store.find_by_token("t1").await.unwrap().unwrap().user_id, "u1");
        assert!(store.revoke("t1"));
        assert!(store.find_by_token("t1").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
