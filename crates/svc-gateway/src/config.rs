//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use shared_bus::{TopicCatalog, TopicPair};
use shared_rpc::ConfigError;
use shared_types::Role;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP bind address
    pub bind_addr: SocketAddr,
    /// Methods that require a validated bearer credential
    pub protected_methods: Vec<String>,
    /// Roles allowed through protected methods
    pub allowed_roles: Vec<Role>,
    /// Bound on the identity validation call
    #[serde(with = "humantime_serde")]
    pub validation_timeout: Duration,
    /// Identity validation topics
    pub identity: TopicPair,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            protected_methods: ["POST", "PUT", "PATCH", "DELETE"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_roles: vec![Role::User, Role::Admin],
            validation_timeout: Duration::from_secs(3),
            identity: TopicCatalog::default().identity_validation,
        }
    }
}

impl GatewayConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override the bind address from `MESH_GATEWAY_ADDR`.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("MESH_GATEWAY_ADDR") {
            self.bind_addr = addr.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "MESH_GATEWAY_ADDR",
                value: addr.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "validation_timeout cannot be 0".into(),
            ));
        }
        if self.allowed_roles.is_empty() {
            return Err(ConfigError::Invalid("allowed_roles cannot be empty".into()));
        }
        for method in &self.protected_methods {
            if method.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "protected_methods cannot contain blanks".into(),
                ));
            }
        }
        self.identity
            .validate()
            .map_err(|e| ConfigError::InvalidTopic(e.to_string()))
    }
}
