//! RPC configuration with validation.
//!
//! Read from TOML, then overridden from the environment. Every duration is
//! written in humantime form (`"3s"`, `"750ms"`).

use crate::server::DEFAULT_MAX_IN_FLIGHT;
use serde::{Deserialize, Serialize};
use shared_bus::{TopicCatalog, DEFAULT_CHANNEL_CAPACITY};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Per-service RPC configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Source tag stamped on every outgoing message
    pub source: String,
    /// Broker buffer per consumer group
    pub channel_capacity: usize,
    /// Consumer group for request subscriptions
    pub consumer_group: String,
    /// Requests one server works on at once; the rest wait on the broker
    pub max_in_flight: usize,
    /// Per call-type timeouts
    pub timeouts: TimeoutConfig,
    /// Request/reply topic names
    pub topics: TopicCatalog,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::for_service("service")
    }
}

/// Timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Fallback for calls without a specific timeout
    #[serde(with = "humantime_serde")]
    pub default: Duration,
    /// Gateway → user bearer validation
    #[serde(with = "humantime_serde")]
    pub identity_validation: Duration,
    /// Media → product ownership check
    #[serde(with = "humantime_serde")]
    pub ownership_check: Duration,
    /// Product → media cascade delete
    #[serde(with = "humantime_serde")]
    pub cascade_delete: Duration,
    /// Order → product lookup
    #[serde(with = "humantime_serde")]
    pub product_lookup: Duration,
    /// How often abandoned registry entries are swept
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(5),
            identity_validation: Duration::from_secs(3),
            ownership_check: Duration::from_secs(1),
            cascade_delete: Duration::from_secs(5),
            product_lookup: Duration::from_secs(2),
            cleanup_interval: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    fn named(&self) -> [(&'static str, Duration); 6] {
        [
            ("default", self.default),
            ("identity_validation", self.identity_validation),
            ("ownership_check", self.ownership_check),
            ("cascade_delete", self.cascade_delete),
            ("product_lookup", self.product_lookup),
            ("cleanup_interval", self.cleanup_interval),
        ]
    }
}

impl RpcConfig {
    /// Defaults with `source` and `consumer_group` set to the service name.
    pub fn for_service(name: &str) -> Self {
        Self {
            source: name.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            consumer_group: name.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            timeouts: TimeoutConfig::default(),
            topics: TopicCatalog::default(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override from process environment variables.
    ///
    /// - `MESH_SOURCE`
    /// - `MESH_CONSUMER_GROUP`
    /// - `MESH_DEFAULT_TIMEOUT_MS`
    /// - `MESH_IDENTITY_TIMEOUT_MS`
    /// - `MESH_BROKER_CAPACITY`
    /// - `MESH_MAX_IN_FLIGHT`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// [`apply_env`](Self::apply_env) with an injectable variable source.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(source) = lookup("MESH_SOURCE") {
            self.source = source;
        }
        if let Some(group) = lookup("MESH_CONSUMER_GROUP") {
            self.consumer_group = group;
        }
        if let Some(ms) = lookup("MESH_DEFAULT_TIMEOUT_MS") {
            self.timeouts.default = parse_millis("MESH_DEFAULT_TIMEOUT_MS", &ms)?;
        }
        if let Some(ms) = lookup("MESH_IDENTITY_TIMEOUT_MS") {
            self.timeouts.identity_validation = parse_millis("MESH_IDENTITY_TIMEOUT_MS", &ms)?;
        }
        if let Some(capacity) = lookup("MESH_BROKER_CAPACITY") {
            self.channel_capacity =
                capacity
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        key: "MESH_BROKER_CAPACITY",
                        value: capacity.clone(),
                    })?;
        }
        if let Some(limit) = lookup("MESH_MAX_IN_FLIGHT") {
            self.max_in_flight = limit.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "MESH_MAX_IN_FLIGHT",
                value: limit.clone(),
            })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::Invalid("source cannot be empty".into()));
        }
        if self.consumer_group.trim().is_empty() {
            return Err(ConfigError::Invalid("consumer_group cannot be empty".into()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "channel_capacity cannot be 0".into(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::InvalidLimit("max_in_flight cannot be 0".into()));
        }
        for (name, value) in self.timeouts.named() {
            if value.is_zero() {
                return Err(ConfigError::InvalidTimeout(format!("{name} cannot be 0")));
            }
        }
        self.topics
            .validate()
            .map_err(|e| ConfigError::InvalidTopic(e.to_string()))
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        })
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
