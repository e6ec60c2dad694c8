//! Event types for the CRM event system
//!
//! Provides shared event definitions and the EventBus used to fan events out
//! to SSE subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// CRM event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrmEvent {
    /// Enrichment run started for a contact
    EnrichmentStarted {
        /// Identifier of this enrichment run
        run_id: Uuid,
        contact_id: String,
        timestamp: DateTime<Utc>,
    },

    /// One pipeline stage finished
    EnrichmentStageCompleted {
        run_id: Uuid,
        contact_id: String,
        /// Stage name (e.g. "identity", "graph", "public_records")
        stage: String,
        /// Whether the stage produced any data
        found: bool,
        timestamp: DateTime<Utc>,
    },

    /// Enrichment run finished and produced a score
    EnrichmentCompleted {
        run_id: Uuid,
        contact_id: String,
        score: u32,
        grade: String,
        /// False when the database write failed and only the report is current
        persisted: bool,
        timestamp: DateTime<Utc>,
    },

    /// Enrichment run aborted (contact missing or database unavailable)
    EnrichmentFailed {
        run_id: Uuid,
        contact_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl CrmEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            CrmEvent::EnrichmentStarted { .. } => "EnrichmentStarted",
            CrmEvent::EnrichmentStageCompleted { .. } => "EnrichmentStageCompleted",
            CrmEvent::EnrichmentCompleted { .. } => "EnrichmentCompleted",
            CrmEvent::EnrichmentFailed { .. } => "EnrichmentFailed",
        }
    }

    /// Contact the event refers to
    pub fn contact_id(&self) -> &str {
        match self {
            CrmEvent::EnrichmentStarted { contact_id, .. }
            | CrmEvent::EnrichmentStageCompleted { contact_id, .. }
            | CrmEvent::EnrichmentCompleted { contact_id, .. }
            | CrmEvent::EnrichmentFailed { contact_id, .. } => contact_id,
        }
    }
}

/// Broadcast bus for CrmEvent
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CrmEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start missing old events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CrmEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: CrmEvent) -> Result<usize, broadcast::error::SendError<CrmEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CrmEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
