//! # Marketplace Mesh Test Suite
//!
//! ```text
//! tests/
//! ├── benches/              # criterion benchmarks for the RPC path
//! └── src/integration/
//!     ├── round_trip.rs     # request/reply through the broker
//!     ├── failure_flows.rs  # timeout, partial cascade delete, handler failure
//!     ├── resilience.rs     # leaks, races, late and malformed replies
//!     └── gateway_e2e.rs    # HTTP through the gateway into every service
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mesh-tests
//! cargo test -p mesh-tests integration::failure_flows
//! cargo bench -p mesh-tests
//! ```

pub mod integration;
