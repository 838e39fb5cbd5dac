//! WorkflowStore - the status mutation service.
//!
//! Every status change goes through [`WorkflowStore::update_status`]: read
//! the current status, validate the edge against the transition table, then
//! commit conditioned on the status still equalling the value read. A lost
//! compare-and-swap re-reads and retries within a bounded budget. Events are
//! emitted only after the commit succeeds, so subscribers never observe a
//! transition that did not persist.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Result, WorkflowError};
use rxflow_core::events::EventBroadcaster;
use rxflow_core::{
    Actor, ClinicalContent, Order, Prescription, PrescriptionStatus, StatusChangeRecord,
};
use rxflow_storage::{PaymentDetails, TransitionUpdate, WorkflowStorage};

/// Input from the AI-drafting collaborator: everything needed to open a
/// prescription and its order in the initial state.
#[derive(Debug, Clone)]
pub struct PrescriptionDraft {
    pub patient_id: String,
    pub doctor_id: String,
    pub content: ClinicalContent,
    pub amount: f64,
    pub decoction_required: bool,
}

/// Service owning prescription reads and status mutations.
pub struct WorkflowStore {
    storage: Arc<dyn WorkflowStorage>,
    events: Arc<EventBroadcaster>,
    max_attempts: u32,
}

impl WorkflowStore {
    pub fn new(
        storage: Arc<dyn WorkflowStorage>,
        events: Arc<EventBroadcaster>,
        max_attempts: u32,
    ) -> Self {
        Self {
            storage,
            events,
            max_attempts,
        }
    }

    /// Creates a prescription in `Pending` with its linked order.
    ///
    /// Entry point for the AI-drafting collaborator: payment pending,
    /// content hidden from the patient.
    pub async fn create_prescription(&self, draft: PrescriptionDraft) -> Result<Prescription> {
        let prescription =
            Prescription::new(draft.patient_id, draft.doctor_id, draft.content);
        let order = Order::new(&prescription.id, draft.amount, draft.decoction_required);

        self.storage.insert_prescription(&prescription).await?;
        self.storage.insert_order(&order).await?;

        debug!(
            prescription_id = %prescription.id,
            doctor_id = %prescription.doctor_id,
            "Created prescription in PENDING"
        );
        Ok(prescription)
    }

    /// Reads a prescription, surfacing absence as `NotFound`.
    pub async fn get_prescription(&self, id: &str) -> Result<Prescription> {
        self.storage
            .get_prescription(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("prescription", id))
    }

    /// Reads the current status of a prescription.
    pub async fn get_status(&self, id: &str) -> Result<PrescriptionStatus> {
        Ok(self.get_prescription(id).await?.status)
    }

    /// Returns the audit history for a prescription, oldest first.
    pub async fn get_history(&self, id: &str) -> Result<Vec<StatusChangeRecord>> {
        Ok(self.storage.audit_history(id).await?)
    }

    /// Applies one validated status transition with bounded CAS retries.
    pub async fn update_status(
        &self,
        id: &str,
        to: PrescriptionStatus,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<Prescription> {
        self.update_with(id, to, actor, reason, None).await
    }

    /// Transition plus optional payment fields, committed as one unit.
    ///
    /// The payment-carrying variant exists for the payment gate: payment
    /// status and patient visibility must flip inside the same CAS commit
    /// as the status write.
    pub(crate) async fn update_with(
        &self,
        id: &str,
        to: PrescriptionStatus,
        actor: Actor,
        reason: Option<String>,
        payment: Option<PaymentDetails>,
    ) -> Result<Prescription> {
        for attempt in 1..=self.max_attempts {
            let current = self.get_prescription(id).await?;

            if !current.status.can_transition_to(to) {
                return Err(WorkflowError::transition_rejected(current.status, to));
            }

            let mut update = TransitionUpdate::new(to, actor.clone(), reason.clone());
            if let Some(details) = payment.clone() {
                update = update.with_payment(details);
            }

            match self
                .storage
                .commit_transition(id, current.status, update)
                .await
            {
                Ok(updated) => {
                    debug!(
                        prescription_id = %id,
                        from = %current.status,
                        to = %to,
                        actor = %actor,
                        "Committed status transition"
                    );
                    self.events.send_status_changed(id, to);
                    return Ok(updated);
                }
                Err(e) if e.is_cas_conflict() => {
                    debug!(
                        prescription_id = %id,
                        attempt,
                        "CAS conflict, re-reading"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        prescription_id = %id,
                        from = %current.status,
                        to = %to,
                        actor = %actor,
                        error = %e,
                        "Storage commit failed"
                    );
                    return Err(e.into());
                }
            }
        }

        warn!(
            prescription_id = %id,
            to = %to,
            attempts = self.max_attempts,
            "Transition retry budget exhausted"
        );
        Err(WorkflowError::ConflictRetryExhausted {
            attempts: self.max_attempts,
        })
    }

    pub(crate) fn storage(&self) -> &Arc<dyn WorkflowStorage> {
        &self.storage
    }

    pub(crate) fn events(&self) -> &Arc<EventBroadcaster> {
        &self.events
    }
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("backend", &self.storage.backend_name())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    // Shadow the crate's single-parameter Result alias; the trait impl
    // below needs the std form with an explicit error type.
    use std::result::Result;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use rxflow_core::{
        DecoctionOrder, ReviewQueueEntry,
    };
    use rxflow_storage::{EnqueueOutcome, StorageError};

    /// Backend whose commits always lose the CAS, for exercising the retry
    /// budget without a real concurrent writer.
    struct ContendedStorage {
        commits_attempted: AtomicU32,
    }

    impl ContendedStorage {
        fn new() -> Self {
            Self {
                commits_attempted: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl WorkflowStorage for ContendedStorage {
        async fn insert_prescription(
            &self,
            _prescription: &Prescription,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>, StorageError> {
            let mut rx = Prescription::new("patient-1", "doctor-1", ClinicalContent::default());
            rx.id = id.to_string();
            Ok(Some(rx))
        }

        async fn list_prescriptions_by_status(
            &self,
            _status: PrescriptionStatus,
        ) -> Result<Vec<Prescription>, StorageError> {
            Ok(Vec::new())
        }

        async fn commit_transition(
            &self,
            _id: &str,
            expected: PrescriptionStatus,
            _update: TransitionUpdate,
        ) -> Result<Prescription, StorageError> {
            self.commits_attempted.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::cas_conflict(
                expected,
                PrescriptionStatus::DoctorReviewing,
            ))
        }

        async fn insert_order(&self, _order: &Order) -> Result<(), StorageError> {
            Ok(())
        }

        async fn get_order_for_prescription(
            &self,
            _prescription_id: &str,
        ) -> Result<Option<Order>, StorageError> {
            Ok(None)
        }

        async fn mark_order_paid(
            &self,
            prescription_id: &str,
            _method: &str,
        ) -> Result<Order, StorageError> {
            Err(StorageError::not_found("order", prescription_id))
        }

        async fn insert_queue_entry_unique(
            &self,
            entry: ReviewQueueEntry,
        ) -> Result<EnqueueOutcome, StorageError> {
            Ok(EnqueueOutcome::Inserted(entry.id))
        }

        async fn get_queue_entry(
            &self,
            _entry_id: &str,
        ) -> Result<Option<ReviewQueueEntry>, StorageError> {
            Ok(None)
        }

        async fn list_queue_for_doctor(
            &self,
            _doctor_id: &str,
        ) -> Result<Vec<ReviewQueueEntry>, StorageError> {
            Ok(Vec::new())
        }

        async fn complete_queue_entry(
            &self,
            entry_id: &str,
            _reason: Option<&str>,
        ) -> Result<ReviewQueueEntry, StorageError> {
            Err(StorageError::not_found("queue entry", entry_id))
        }

        async fn pending_entries_for_prescription(
            &self,
            _prescription_id: &str,
        ) -> Result<Vec<ReviewQueueEntry>, StorageError> {
            Ok(Vec::new())
        }

        async fn insert_decoction_order(
            &self,
            _order: &DecoctionOrder,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        async fn list_decoction_orders(
            &self,
            _prescription_id: &str,
        ) -> Result<Vec<DecoctionOrder>, StorageError> {
            Ok(Vec::new())
        }

        async fn append_audit(&self, _record: StatusChangeRecord) -> Result<(), StorageError> {
            Ok(())
        }

        async fn audit_history(
            &self,
            _prescription_id: &str,
        ) -> Result<Vec<StatusChangeRecord>, StorageError> {
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &'static str {
            "contended"
        }
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_surfaces_conflict() {
        let storage = Arc::new(ContendedStorage::new());
        let store = WorkflowStore::new(
            storage.clone(),
            Arc::new(EventBroadcaster::new()),
            3,
        );

        let err = store
            .update_status(
                "rx-1",
                PrescriptionStatus::Approved,
                Actor::System,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::ConflictRetryExhausted { attempts: 3 }
        ));
        assert_eq!(storage.commits_attempted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_event_emitted_when_every_commit_loses() {
        let storage = Arc::new(ContendedStorage::new());
        let events = Arc::new(EventBroadcaster::new());
        let mut receiver = events.subscribe();
        let store = WorkflowStore::new(storage, events, 2);

        let _ = store
            .update_status("rx-1", PrescriptionStatus::Approved, Actor::System, None)
            .await
            .unwrap_err();

        assert!(matches!(
            receiver.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}
