//! # Lease-Sign Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Status computation and sign-path benchmarks
//! └── src/integration/
//!     ├── scenarios.rs  # End-to-end signing flows over the event bus
//!     └── races.rs      # Concurrent signing and binding
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p lease-tests
//!
//! # By category
//! cargo test -p lease-tests integration::scenarios::
//! cargo test -p lease-tests integration::races::
//!
//! # Benchmarks
//! cargo bench -p lease-tests
//! ```

pub mod integration;
