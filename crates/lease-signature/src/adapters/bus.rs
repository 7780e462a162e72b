//! # Event Bus Adapter
//!
//! Delivers signature milestones to the shared event bus.
//!
//! ## Event Flow
//!
//! ```text
//! [Lease Signature] ──LeaseEvent──→ BusNotifier ──OutboxEnvelope──→ [Event Bus]
//!                                                                      │
//!                                         ┌────────────────────────────┤
//!                                         ↓                            ↓
//!                                 [email / SMS sender]          [journal / audit]
//! ```
//!
//! Each event is wrapped in an envelope with a fresh `event_id` so
//! consumers can deduplicate.

use crate::ports::outbound::{NotifyError, SignatureNotifier};
use async_trait::async_trait;
use shared_bus::{EventPublisher, LeaseEvent, OutboxEnvelope};
use std::sync::Arc;
use tracing::info;

/// Notifier publishing onto an [`EventPublisher`].
pub struct BusNotifier<P>
where
    P: EventPublisher,
{
    publisher: Arc<P>,
}

impl<P> BusNotifier<P>
where
    P: EventPublisher,
{
    pub fn new(publisher: Arc<P>) -> Self {
        Self { publisher }
    }

    /// Get a reference to the event publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

#[async_trait]
impl<P> SignatureNotifier for BusNotifier<P>
where
    P: EventPublisher + Send + Sync,
{
    async fn notify(&self, event: LeaseEvent) -> Result<(), NotifyError> {
        let envelope = OutboxEnvelope::new(event);
        let event_id = envelope.event_id;
        let kind = envelope.event.kind();
        let lease_id = envelope.event.lease_id();

        let receivers = self.publisher.publish(envelope).await;

        info!(
            %event_id,
            kind,
            %lease_id,
            receivers,
            "Milestone event written to outbox"
        );
        Ok(())
    }
}
