//! # Node Configuration
//!
//! One TOML file configures every service in the node. The path comes from
//! `MESH_CONFIG`; without it the defaults are used. Environment overrides
//! are applied after the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared_rpc::RpcConfig;
use shared_types::{Role, ServiceName};
use std::path::Path;
use svc_gateway::GatewayConfig;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Bus settings shared by every service; `source` and
    /// `consumer_group` are replaced per service.
    pub rpc: RpcConfig,
    /// HTTP gateway.
    pub gateway: GatewayConfig,
    /// Bearer tokens issued at startup.
    pub identities: Vec<SeedIdentity>,
}

/// A bearer token known to the user service from startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedIdentity {
    pub token: String,
    pub user_id: String,
    pub role: Role,
}

impl NodeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse node configuration")
    }

    /// File from `MESH_CONFIG` (or defaults), then environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("MESH_CONFIG") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.rpc.apply_env_from(&lookup)?;
        config.gateway.apply_env_from(&lookup)?;
        config.resolve()?;
        Ok(config)
    }

    /// Align the gateway with the shared topic catalogue and validate.
    pub fn resolve(&mut self) -> Result<()> {
        self.gateway.identity = self.rpc.topics.identity_validation.clone();
        self.rpc.validate().context("Invalid rpc configuration")?;
        self.gateway
            .validate()
            .context("Invalid gateway configuration")?;
        Ok(())
    }

    /// Bus settings for one service.
    pub fn rpc_for(&self, service: ServiceName) -> RpcConfig {
        RpcConfig {
            source: service.to_string(),
            consumer_group: service.to_string(),
            ..self.rpc.clone()
        }
    }
}
