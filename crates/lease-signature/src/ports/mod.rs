//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that request handlers use
//! - **Outbound (Driven)**: Stores, proof generator, artifact storage, notifier

pub mod inbound;
pub mod outbound;
