//! ReviewQueueManager - per-doctor review backlog with de-duplication.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use rxflow_core::ReviewQueueEntry;
use rxflow_storage::{EnqueueOutcome, WorkflowStorage};

/// Manages the per-doctor review backlog.
///
/// De-duplication is not application logic here: the storage backend's
/// unique index over (prescription, doctor, pending) is what closes races
/// between concurrent submissions. This service just surfaces the outcome.
pub struct ReviewQueueManager {
    storage: Arc<dyn WorkflowStorage>,
}

impl ReviewQueueManager {
    pub fn new(storage: Arc<dyn WorkflowStorage>) -> Self {
        Self { storage }
    }

    /// Enqueues a prescription for a doctor's review.
    ///
    /// Idempotent: if a pending entry already exists for the pair, its id is
    /// returned instead of inserting a second one.
    pub async fn enqueue(
        &self,
        prescription_id: &str,
        doctor_id: &str,
        priority: u8,
    ) -> Result<String> {
        let entry = ReviewQueueEntry::new(prescription_id, doctor_id, priority);
        let outcome = self.storage.insert_queue_entry_unique(entry).await?;

        match &outcome {
            EnqueueOutcome::Inserted(id) => {
                debug!(
                    prescription_id = %prescription_id,
                    doctor_id = %doctor_id,
                    entry_id = %id,
                    priority,
                    "Enqueued for review"
                );
            }
            EnqueueOutcome::AlreadyPending(id) => {
                debug!(
                    prescription_id = %prescription_id,
                    doctor_id = %doctor_id,
                    entry_id = %id,
                    "Already pending, returning existing entry"
                );
            }
        }
        Ok(outcome.entry_id().to_string())
    }

    /// The doctor's pending backlog, highest priority first; within a
    /// priority band, earliest submission first.
    pub async fn dequeue_for_doctor(&self, doctor_id: &str) -> Result<Vec<ReviewQueueEntry>> {
        let mut entries = self.storage.list_queue_for_doctor(doctor_id).await?;
        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });
        Ok(entries)
    }

    /// Marks an entry completed. Completing an already-completed entry is a
    /// no-op, not an error.
    pub async fn complete(&self, entry_id: &str) -> Result<()> {
        self.storage.complete_queue_entry(entry_id, None).await?;
        Ok(())
    }

    /// Marks an entry completed with a reason.
    pub async fn complete_with_reason(&self, entry_id: &str, reason: &str) -> Result<()> {
        self.storage
            .complete_queue_entry(entry_id, Some(reason))
            .await?;
        Ok(())
    }

    /// Resolves every pending entry referencing a prescription.
    ///
    /// Used when a prescription leaves the review flow (e.g. the patient
    /// declines an approved prescription). Returns how many were resolved.
    pub async fn resolve_for_prescription(
        &self,
        prescription_id: &str,
        reason: &str,
    ) -> Result<usize> {
        let pending = self
            .storage
            .pending_entries_for_prescription(prescription_id)
            .await?;
        let count = pending.len();
        for entry in pending {
            self.storage
                .complete_queue_entry(&entry.id, Some(reason))
                .await?;
        }
        if count > 0 {
            debug!(
                prescription_id = %prescription_id,
                resolved = count,
                reason,
                "Resolved pending queue entries"
            );
        }
        Ok(count)
    }
}

impl std::fmt::Debug for ReviewQueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewQueueManager")
            .field("backend", &self.storage.backend_name())
            .finish()
    }
}
