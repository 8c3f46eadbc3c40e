//! Domain event system: decoupled notification of context changes.
//!
//! The turn engine publishes events; the gateway logs them and tests can
//! subscribe to observe turns without reaching into the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::context::{ContextId, Sentiment};

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A new conversation context was allocated
    ContextCreated {
        context_id: ContextId,
        user_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A turn was processed and merged
    TurnCompleted {
        context_id: ContextId,
        turn_count: u64,
        sentiment: Sentiment,
        entities_extracted: usize,
        timestamp: DateTime<Utc>,
    },

    /// A caller referenced a context the store does not hold
    ContextNotFound {
        context_id: ContextId,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
