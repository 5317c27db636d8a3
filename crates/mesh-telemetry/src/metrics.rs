//! Prometheus metrics for the RPC bridge.
//!
//! All metrics follow the naming convention: `mesh_rpc_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Finished client calls by request topic and outcome
    pub static ref RPC_CALLS: CounterVec = CounterVec::new(
        Opts::new("mesh_rpc_calls_total", "Client calls by topic and outcome"),
        &["topic", "outcome"]  // outcome: reply/timeout/transport
    ).expect("metric creation failed");

    /// Replies that arrived after their caller gave up
    pub static ref LATE_REPLIES: Counter = Counter::new(
        "mesh_rpc_late_replies_total",
        "Replies discarded because no call was pending for them"
    ).expect("metric creation failed");

    /// Handler failures converted into error replies
    pub static ref HANDLER_ERRORS: CounterVec = CounterVec::new(
        Opts::new("mesh_rpc_handler_errors_total", "Handler failures by request topic"),
        &["topic"]
    ).expect("metric creation failed");

    /// Client call latency, publish to resolution
    pub static ref RPC_CALL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "mesh_rpc_call_duration_seconds",
            "Time from publishing a request to its resolution"
        ).buckets(exponential_buckets(0.0005, 2.0, 15).expect("valid buckets")),
        &["topic"]
    ).expect("metric creation failed");
}

/// How a client call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Reply,
    Timeout,
    Transport,
}

impl CallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        }
    }
}

/// Handle proving the metrics were registered
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Fails if called twice in one process.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RPC_CALLS.clone()),
        Box::new(LATE_REPLIES.clone()),
        Box::new(HANDLER_ERRORS.clone()),
        Box::new(RPC_CALL_DURATION.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record one finished client call.
pub fn record_rpc_call(topic: &str, outcome: CallOutcome, elapsed: Duration) {
    RPC_CALLS.with_label_values(&[topic, outcome.as_str()]).inc();
    RPC_CALL_DURATION
        .with_label_values(&[topic])
        .observe(elapsed.as_secs_f64());
}

pub fn record_late_reply() {
    LATE_REPLIES.inc();
}

pub fn record_handler_error(topic: &str) {
    HANDLER_ERRORS.with_label_values(&[topic]).inc();
}
