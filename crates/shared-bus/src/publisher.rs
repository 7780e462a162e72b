//! # Event Publisher
//!
//! Defines the publishing side of the outbox bus.

use crate::events::{EventFilter, OutboxEnvelope};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the outbox.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an envelope.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    async fn publish(&self, envelope: OutboxEnvelope) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the outbox bus.
///
/// Uses `tokio::sync::broadcast` for live subscribers and keeps the most
/// recent envelopes in a bounded journal so late readers (and tests) can
/// inspect what was written.
pub struct InMemoryEventBus {
    /// Broadcast sender for envelopes.
    sender: broadcast::Sender<OutboxEnvelope>,

    /// Bounded journal of published envelopes, oldest first.
    journal: RwLock<VecDeque<OutboxEnvelope>>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel and journal capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            journal: RwLock::new(VecDeque::with_capacity(capacity)),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topic_key = format!("{:?}", filter.topics);

        *self.subscriptions.write().entry(topic_key.clone()).or_insert(0) += 1;

        debug!(topics = ?filter.topics, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// Snapshot of the journal, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<OutboxEnvelope> {
        self.journal.read().iter().cloned().collect()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, envelope: OutboxEnvelope) -> usize {
        let topic = envelope.event.topic();
        let kind = envelope.event.kind();
        let event_id = envelope.event_id;

        self.events_published.fetch_add(1, Ordering::Relaxed);

        {
            let mut journal = self.journal.write();
            if journal.len() == self.capacity {
                journal.pop_front();
            }
            journal.push_back(envelope.clone());
        }

        match self.sender.send(envelope) {
            Ok(receiver_count) => {
                debug!(
                    topic = ?topic,
                    kind,
                    %event_id,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(e) => {
                // No live receivers; the journal still holds the envelope.
                warn!(
                    topic = ?topic,
                    kind,
                    %event_id,
                    error = %e,
                    "Event not delivered (no receivers)"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
