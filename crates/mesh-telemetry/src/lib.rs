//! # Mesh Telemetry
//!
//! Logging and metrics shared by every marketplace service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesh_telemetry::{init_logging, register_metrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! register_metrics()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `marketplace-mesh` | Service name attached to logs |
//! | `MESH_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `MESH_JSON_LOGS` | `false` outside containers | JSON formatted output |
//! | `MESH_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_handler_error, record_late_reply, record_rpc_call, register_metrics,
    CallOutcome, MetricsHandle,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}
