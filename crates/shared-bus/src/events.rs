//! # Lease Events
//!
//! Milestone events emitted by the signature core, and the outbox envelope
//! they travel in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{LeaseId, ProfileId};
use uuid::Uuid;

/// Fields shared by every signature milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMilestone {
    /// Lease the milestone belongs to.
    pub lease_id: LeaseId,
    /// Profile to notify, when the recipient has an account.
    pub recipient_profile_id: Option<ProfileId>,
    /// Email to notify (invitation address for unclaimed tenants).
    pub recipient_email: Option<String>,
    /// Profile whose signature triggered the milestone.
    pub signer_profile_id: Option<ProfileId>,
    /// Display name of the other party, shown in the notification.
    pub counterpart_name: String,
    /// Property address, shown in the notification.
    pub property_address: String,
}

/// Which party a `FullySigned` notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Owner,
    Tenant,
}

/// Follow-up action suggested once a lease is fully signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    /// Owner: schedule the move-in inspection (état des lieux d'entrée).
    ScheduleEntryInspection,
    /// Tenant: settle the deposit and first rent invoice.
    PayInitialInvoice,
}

impl NextStep {
    /// Hint text carried to the notification templates.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::ScheduleEntryInspection => "Planifiez l'état des lieux d'entrée",
            Self::PayInitialInvoice => "Réglez le dépôt de garantie et le premier loyer",
        }
    }
}

/// All events the signature core produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeaseEvent {
    /// A tenant-family signer signed; addressed to the owner.
    TenantSigned(SignatureMilestone),

    /// The owner signed; addressed to the tenant.
    OwnerSigned(SignatureMilestone),

    /// Every signer signed. Emitted once per audience.
    FullySigned {
        #[serde(flatten)]
        milestone: SignatureMilestone,
        audience: Audience,
        next_step: NextStep,
    },
}

impl LeaseEvent {
    /// Topic used for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TenantSigned(_) | Self::OwnerSigned(_) => EventTopic::SignatureProgress,
            Self::FullySigned { .. } => EventTopic::LeaseCompletion,
        }
    }

    /// Stable event name written to the outbox.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TenantSigned(_) => "lease.tenant_signed",
            Self::OwnerSigned(_) => "lease.owner_signed",
            Self::FullySigned { .. } => "lease.fully_signed",
        }
    }

    #[must_use]
    pub fn milestone(&self) -> &SignatureMilestone {
        match self {
            Self::TenantSigned(m) | Self::OwnerSigned(m) => m,
            Self::FullySigned { milestone, .. } => milestone,
        }
    }

    #[must_use]
    pub fn lease_id(&self) -> LeaseId {
        self.milestone().lease_id
    }
}

/// An event as written to the outbox.
///
/// `event_id` lets downstream consumers deduplicate at-least-once deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEnvelope {
    pub event_id: Uuid,
    pub version: u16,
    pub occurred_at: DateTime<Utc>,
    pub event: LeaseEvent,
}

impl OutboxEnvelope {
    /// Wrap an event with a fresh id and the current time.
    #[must_use]
    pub fn new(event: LeaseEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            version: crate::PROTOCOL_VERSION,
            occurred_at: Utc::now(),
            event,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Individual signatures.
    SignatureProgress,
    /// Lease became fully signed.
    LeaseCompletion,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Leases to include. Empty means all leases.
    pub leases: Vec<LeaseId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            leases: Vec::new(),
        }
    }

    /// Create a filter for events of one lease.
    #[must_use]
    pub fn for_lease(lease_id: LeaseId) -> Self {
        Self {
            topics: Vec::new(),
            leases: vec![lease_id],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LeaseEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let lease_match = self.leases.is_empty() || self.leases.contains(&event.lease_id());

        topic_match && lease_match
    }
}
