//! # Adapters Module
//!
//! Infrastructure adapters implementing the outbound ports.

pub mod bus;
pub mod memory;
pub mod proof;
