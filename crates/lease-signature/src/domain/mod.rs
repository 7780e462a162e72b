//! # Domain Layer
//!
//! Pure signature logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod config;
pub mod entities;
pub mod errors;
pub mod milestones;
pub mod records;
pub mod rights;
pub mod status;
