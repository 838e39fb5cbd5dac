//! WorkflowEngine - explicit composition of the engine services.
//!
//! One constructor-injected storage handle, no process-wide state. The thin
//! route layer, admin dashboards, and the scheduled-job runner all talk to
//! this type.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::audit::AuditLogger;
use crate::config::EngineConfig;
use crate::dispatcher::{DispatchReport, FulfillmentDispatcher};
use crate::error::Result;
use crate::payment::PaymentGate;
use crate::queue::ReviewQueueManager;
use crate::store::{PrescriptionDraft, WorkflowStore};
use rxflow_core::events::{EventBroadcaster, WorkflowEvent};
use rxflow_core::{
    Actor, Prescription, PrescriptionStatus, ReviewQueueEntry, StatusChangeRecord,
};
use rxflow_storage::WorkflowStorage;

/// Reason recorded on queue entries resolved by a patient declining.
const PATIENT_REJECTED: &str = "patient_rejected";

/// The assembled workflow engine.
pub struct WorkflowEngine {
    store: Arc<WorkflowStore>,
    queue: Arc<ReviewQueueManager>,
    payment: PaymentGate,
    dispatcher: FulfillmentDispatcher,
    audit: AuditLogger,
}

impl WorkflowEngine {
    /// Builds an engine over the given storage backend.
    pub fn new(storage: Arc<dyn WorkflowStorage>, config: EngineConfig) -> Self {
        let events = Arc::new(EventBroadcaster::with_capacity(config.event_buffer_size));
        let store = Arc::new(WorkflowStore::new(
            storage.clone(),
            events,
            config.max_transition_attempts,
        ));
        let queue = Arc::new(ReviewQueueManager::new(storage.clone()));
        let payment = PaymentGate::new(store.clone(), queue.clone());
        let dispatcher = FulfillmentDispatcher::new(store.clone(), config.dispatch_batch_size);
        let audit = AuditLogger::new(storage);

        Self {
            store,
            queue,
            payment,
            dispatcher,
            audit,
        }
    }

    // ==================== Prescriptions ====================

    /// Creates a prescription in `Pending` (AI-drafting collaborator input).
    pub async fn create_prescription(&self, draft: PrescriptionDraft) -> Result<Prescription> {
        self.store.create_prescription(draft).await
    }

    /// Current status of a prescription.
    pub async fn get_status(&self, prescription_id: &str) -> Result<PrescriptionStatus> {
        self.store.get_status(prescription_id).await
    }

    /// Full prescription record.
    pub async fn get_prescription(&self, prescription_id: &str) -> Result<Prescription> {
        self.store.get_prescription(prescription_id).await
    }

    /// Applies a status transition on behalf of an actor.
    ///
    /// When a patient declines an approved prescription, any pending review
    /// queue entries are resolved with reason `"patient_rejected"` rather
    /// than left pending indefinitely.
    pub async fn update_status(
        &self,
        prescription_id: &str,
        to: PrescriptionStatus,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<Prescription> {
        let updated = self
            .store
            .update_status(prescription_id, to, actor.clone(), reason)
            .await?;

        if to == PrescriptionStatus::Rejected
            && matches!(actor, Actor::Patient(_))
            && let Err(e) = self
                .queue
                .resolve_for_prescription(prescription_id, PATIENT_REJECTED)
                .await
        {
            // The rejection itself committed; the backlog cleanup can be
            // retried by the next enqueue-completing action.
            warn!(
                prescription_id = %prescription_id,
                error = %e,
                "Failed to resolve queue entries after patient rejection"
            );
        }

        Ok(updated)
    }

    /// Audit history, oldest first.
    pub async fn get_history(&self, prescription_id: &str) -> Result<Vec<StatusChangeRecord>> {
        self.store.get_history(prescription_id).await
    }

    // ==================== Review queue ====================

    /// Enqueues a prescription for a doctor's review (idempotent).
    pub async fn enqueue(
        &self,
        prescription_id: &str,
        doctor_id: &str,
        priority: u8,
    ) -> Result<String> {
        self.queue.enqueue(prescription_id, doctor_id, priority).await
    }

    /// A doctor's pending backlog in review order.
    pub async fn dequeue_for_doctor(&self, doctor_id: &str) -> Result<Vec<ReviewQueueEntry>> {
        self.queue.dequeue_for_doctor(doctor_id).await
    }

    /// Marks a queue entry completed (idempotent).
    pub async fn complete_entry(&self, entry_id: &str) -> Result<()> {
        self.queue.complete(entry_id).await
    }

    // ==================== Payment ====================

    /// Confirms payment (payment collaborator callback).
    pub async fn confirm_payment(
        &self,
        prescription_id: &str,
        amount: f64,
        method: &str,
    ) -> Result<Prescription> {
        self.payment
            .confirm_payment(prescription_id, amount, method)
            .await
    }

    // ==================== Fulfillment ====================

    /// One dispatcher sweep (scheduled-job runner entry point).
    pub async fn auto_process_paid(&self) -> Result<DispatchReport> {
        self.dispatcher.auto_process_paid().await
    }

    /// The dispatcher itself, for callers that run the periodic loop.
    pub fn dispatcher(&self) -> &FulfillmentDispatcher {
        &self.dispatcher
    }

    // ==================== Events & components ====================

    /// Subscribes to committed-transition notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.store.events().subscribe()
    }

    /// The audit log read surface.
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("store", &self.store)
            .finish()
    }
}
