//! Cross-service integration tests.

pub mod failure_flows;
pub mod gateway_e2e;
pub mod resilience;
pub mod round_trip;
pub mod support;
