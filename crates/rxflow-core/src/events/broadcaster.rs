//! Event broadcaster for workflow notifications.
//!
//! Uses tokio's broadcast channel for multi-producer, multi-consumer
//! messaging. Sends are fire-and-forget: with no subscribers the event is
//! dropped, and a slow subscriber only loses its own backlog.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{StatusChangedEvent, WorkflowEvent};
use crate::status::PrescriptionStatus;

/// Default buffer size for the broadcast channel.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Broadcaster for workflow events.
///
/// Thread-safe; clone or wrap in an `Arc` to share across services.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event;
    /// 0 when nobody is listening.
    pub fn send(&self, event: WorkflowEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Send a status-changed event.
    pub fn send_status_changed(
        &self,
        prescription_id: impl Into<String>,
        new_status: PrescriptionStatus,
    ) -> usize {
        self.send(WorkflowEvent::StatusChanged(StatusChangedEvent::new(
            prescription_id,
            new_status,
        )))
    }

    /// Subscribe to events broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
