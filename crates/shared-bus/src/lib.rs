//! # Shared Bus - Outbox for Signature Milestones
//!
//! The signature core writes milestone events here; delivery to email/push
//! channels happens downstream and is at-least-once.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────┐
//! │ Signature core   │                    │ Mail / push      │
//! │                  │    publish()       │ delivery worker  │
//! │                  │ ──────┐            │                  │
//! └──────────────────┘       │            └──────────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │          │
//!                      │   (outbox)   │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```
//!
//! Publishing never blocks on delivery: a publish with no subscriber is
//! counted and dropped with a warning.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{
    Audience, EventFilter, EventTopic, LeaseEvent, NextStep, OutboxEnvelope, SignatureMilestone,
};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError};

/// Current schema version of outbox envelopes.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
