//! Operational routes and envelope rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use shared_types::Response as Envelope;
use tracing::error;

/// Render a bus envelope as an HTTP response with the envelope's status.
pub fn envelope_response<T: Serialize>(envelope: Envelope<T>) -> Response {
    let status = StatusCode::from_u16(envelope.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

/// `/health` and `/metrics`. Neither route is protected.
pub fn ops_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> Response {
    match mesh_telemetry::encode_metrics() {
        Ok(body) => (
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
