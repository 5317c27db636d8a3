//! Service identifiers used as source tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The cooperating services of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    User,
    Product,
    Media,
    Order,
    Gateway,
}

impl ServiceName {
    pub const ALL: [ServiceName; 5] = [
        ServiceName::User,
        ServiceName::Product,
        ServiceName::Media,
        ServiceName::Order,
        ServiceName::Gateway,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::User => "user",
            ServiceName::Product => "product",
            ServiceName::Media => "media",
            ServiceName::Order => "order",
            ServiceName::Gateway => "gateway",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown service: {s}"))
    }
}
