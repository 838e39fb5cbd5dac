//! AuditLogger - append-only status-change records.

use std::sync::Arc;

use crate::error::Result;
use rxflow_core::{Actor, PrescriptionStatus, StatusChangeRecord};
use rxflow_storage::WorkflowStorage;

/// Reader/writer for the append-only audit trail.
///
/// Transition commits append their own record atomically inside the
/// storage layer; this service is the read surface plus the entry point for
/// records not tied to a status write.
pub struct AuditLogger {
    storage: Arc<dyn WorkflowStorage>,
}

impl AuditLogger {
    pub fn new(storage: Arc<dyn WorkflowStorage>) -> Self {
        Self { storage }
    }

    /// Appends a status-change record.
    pub async fn append(
        &self,
        prescription_id: &str,
        from_status: PrescriptionStatus,
        to_status: PrescriptionStatus,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<()> {
        let record =
            StatusChangeRecord::new(prescription_id, from_status, to_status, actor, reason);
        self.storage.append_audit(record).await?;
        Ok(())
    }

    /// Returns the audit history for a prescription, oldest first.
    pub async fn get_history(&self, prescription_id: &str) -> Result<Vec<StatusChangeRecord>> {
        Ok(self.storage.audit_history(prescription_id).await?)
    }

    /// Checks that a history replays cleanly from `Pending`: the first row
    /// starts at the initial state, each row chains onto the previous one,
    /// and every edge is in the transition table.
    pub fn is_valid_replay(history: &[StatusChangeRecord]) -> bool {
        let mut current = PrescriptionStatus::INITIAL;
        for record in history {
            if record.from_status != current {
                return false;
            }
            if !record.from_status.can_transition_to(record.to_status) {
                return false;
            }
            current = record.to_status;
        }
        true
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("backend", &self.storage.backend_name())
            .finish()
    }
}
