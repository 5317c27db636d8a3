//! # Shared RPC - Request/Reply over the Bus
//!
//! Lets one service call another through the broker and wait, with a bounded
//! timeout, for the correlated reply.
//!
//! ```text
//! caller ──► RpcClient ──publish──► <op>-request ──► RpcServer ──► handler
//!               │                                         │
//!               │ register / wait                         │ publish reply
//!               ▼                                         ▼
//!       CorrelationRegistry ◄── ReplyDispatcher ◄── <op>-reply
//! ```
//!
//! ## Guarantees
//!
//! - A correlation id is resolved or expired at most once
//! - A finished call never leaves an entry behind
//! - A call returns within its timeout plus scheduling slack
//! - Failures cross the bus as `Response` values, never as panics

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod payload;
pub mod pending;
pub mod server;

pub use client::RpcClient;
pub use config::{ConfigError, RpcConfig, TimeoutConfig};
pub use dispatcher::{dispatch_reply, DispatchOutcome, ReplyDispatcher};
pub use endpoint::RpcEndpoint;
pub use error::{HandlerError, RegistryError, RpcError};
pub use payload::normalize_payload;
pub use pending::{cleanup_task, CorrelationRegistry, PendingCallGuard, RegistryStats, Reply};
pub use server::{process_request, RpcHandler, RpcServer};
