//! Gateway middleware.

mod auth;

pub use auth::{AccessPolicy, AccessValidationLayer, AccessValidationService};
