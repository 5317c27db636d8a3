//! # Topic Catalogue
//!
//! One request topic and one reply topic per (caller, callee) exchange.

use crate::BusError;
use serde::{Deserialize, Serialize};

/// Operation name of the bearer-token validation exchange (gateway → user).
pub const IDENTITY_VALIDATION: &str = "identity-validation";
/// Operation name of the product ownership check (media → product).
pub const OWNERSHIP_CHECK: &str = "ownership-check";
/// Operation name of the media cascade delete (product → media).
pub const CASCADE_DELETE: &str = "cascade-delete";
/// Operation name of the product lookup (order → product).
pub const PRODUCT_LOOKUP: &str = "product-lookup";

/// A request topic and the topic its replies come back on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicPair {
    pub request: String,
    pub reply: String,
}

impl TopicPair {
    pub fn new(request: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            reply: reply.into(),
        }
    }

    /// `<operation>-request` / `<operation>-reply`.
    pub fn for_operation(operation: &str) -> Self {
        Self::new(format!("{operation}-request"), format!("{operation}-reply"))
    }

    /// Both topics non-empty and distinct.
    pub fn validate(&self) -> Result<(), BusError> {
        if self.request.trim().is_empty() || self.reply.trim().is_empty() {
            return Err(BusError::InvalidTopic("topic name cannot be empty".into()));
        }
        if self.request == self.reply {
            return Err(BusError::InvalidTopic(format!(
                "request and reply topics are both '{}'",
                self.request
            )));
        }
        Ok(())
    }
}

/// Every exchange the marketplace services make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicCatalog {
    pub identity_validation: TopicPair,
    pub ownership_check: TopicPair,
    pub cascade_delete: TopicPair,
    pub product_lookup: TopicPair,
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self {
            identity_validation: TopicPair::for_operation(IDENTITY_VALIDATION),
            ownership_check: TopicPair::for_operation(OWNERSHIP_CHECK),
            cascade_delete: TopicPair::for_operation(CASCADE_DELETE),
            product_lookup: TopicPair::for_operation(PRODUCT_LOOKUP),
        }
    }
}

impl TopicCatalog {
    pub fn pairs(&self) -> [&TopicPair; 4] {
        [
            &self.identity_validation,
            &self.ownership_check,
            &self.cascade_delete,
            &self.product_lookup,
        ]
    }

    pub fn validate(&self) -> Result<(), BusError> {
        self.pairs().into_iter().try_for_each(TopicPair::validate)
    }
}
