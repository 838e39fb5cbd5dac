//! Event types emitted by the workflow engine.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::status::PrescriptionStatus;

/// Event emitted after a committed status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    /// The prescription that changed.
    #[serde(rename = "prescriptionId")]
    pub prescription_id: String,
    /// The status it changed to.
    #[serde(rename = "newStatus")]
    pub new_status: PrescriptionStatus,
    /// Timestamp of the event.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl StatusChangedEvent {
    /// Create a new status-changed event.
    pub fn new(prescription_id: impl Into<String>, new_status: PrescriptionStatus) -> Self {
        Self {
            prescription_id: prescription_id.into(),
            new_status,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Unified event enum carried on the broadcast channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    StatusChanged(StatusChangedEvent),
}

impl WorkflowEvent {
    /// The prescription id this event concerns.
    pub fn prescription_id(&self) -> &str {
        match self {
            Self::StatusChanged(e) => &e.prescription_id,
        }
    }
}
