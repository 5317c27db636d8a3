//! Mesh node entry point.

use anyhow::{Context, Result};
use mesh_node::{MeshNode, NodeConfig};
use mesh_telemetry::{init_logging, register_metrics, TelemetryConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::for_service("mesh-node")).context("Failed to initialize logging")?;
    let _metrics = register_metrics().context("Failed to register metrics")?;

    let config = NodeConfig::from_env()?;
    if config.identities.is_empty() {
        warn!("No identities configured; every protected request will be rejected");
    }
    let addr = config.gateway.bind_addr;

    let node = MeshNode::start(config)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Gateway listening. Press Ctrl+C to stop.");

    axum::serve(listener, node.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    node.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}
