//! # Gateway
//!
//! HTTP entry point of the mesh. Mutating requests are authorized by asking
//! the user service to validate the bearer credential over the bus:
//!
//! ```text
//! POST /products ──► AccessValidationLayer ──► identity-validation-request
//!                           │                            │
//!                           │   ◄── identity-validation-reply (Identity | 401)
//!                           ▼
//!               inner route (Extension<Identity>)  or  JSON error envelope
//! ```
//!
//! GET, HEAD and OPTIONS never reach the bus.

pub mod config;
pub mod middleware;
pub mod router;

pub use config::GatewayConfig;
pub use middleware::{AccessPolicy, AccessValidationLayer, AccessValidationService};
pub use router::{envelope_response, ops_router};

use shared_bus::{BusError, MessagePublisher, MessageSubscriber};
use shared_rpc::RpcEndpoint;

/// Listen for identity validation replies on the gateway's endpoint.
pub fn serve<B>(endpoint: &mut RpcEndpoint<B>, config: &GatewayConfig) -> Result<(), BusError>
where
    B: MessagePublisher + MessageSubscriber + 'static,
{
    endpoint.listen_replies(&config.identity)
}
