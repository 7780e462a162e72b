//! # Shared Types Crate
//!
//! Identifiers, roles and statuses used across the lease-signature workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here.
//! - **Normalize at the boundary**: raw role and status strings coming from
//!   the data store are parsed into enums once; internal logic never compares
//!   raw strings.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
