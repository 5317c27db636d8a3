//! Payloads of the request/reply exchanges between services.
//!
//! Each exchange has a request type and the `data` type of its success
//! reply. Callers and callees depend on these, never on each other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role attached to an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Guest,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "guest" => Ok(Self::Guest),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Reply data of identity validation: who the bearer is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

/// One id or many.
///
/// Callers send a bare id or a list; handlers treat both as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductIds {
    One(String),
    Many(Vec<String>),
}

impl ProductIds {
    /// Non-blank ids, trimmed, duplicates removed, first occurrence order.
    pub fn into_vec(self) -> Vec<String> {
        let ids = match self {
            Self::One(id) => vec![id],
            Self::Many(ids) => ids,
        };
        let mut out: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.trim();
            if !id.is_empty() && !out.iter().any(|seen| seen == id) {
                out.push(id.to_string());
            }
        }
        out
    }
}

impl From<Vec<String>> for ProductIds {
    fn from(ids: Vec<String>) -> Self {
        Self::Many(ids)
    }
}

/// Request of the ownership check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipQuery {
    pub product_id: String,
    pub user_id: String,
}

/// Product fields other services are allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub price_cents: u64,
    pub owner_id: String,
}

/// Reply data of a product lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLookup {
    pub found: Vec<ProductSummary>,
    /// Requested ids with no product
    pub missing: Vec<String>,
}

/// Reply data of a cascade delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeDeleteResult {
    /// Ids of the media rows removed
    pub deleted: Vec<String>,
    pub count: usize,
}
