//! PaymentGate - unlocks visibility and enqueues review on confirmed payment.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, WorkflowError};
use crate::queue::ReviewQueueManager;
use crate::store::WorkflowStore;
use rxflow_core::{Actor, Prescription, PrescriptionStatus};
use rxflow_storage::PaymentDetails;

/// Review priority attached to the post-payment enqueue.
const PAID_REVIEW_PRIORITY: u8 = 1;

/// Handles payment confirmation callbacks.
///
/// Tolerant of duplicates and retries: a prescription already paid yields
/// `AlreadyProcessed`, and a racing duplicate that loses the CAS resolves to
/// the same answer. A duplicate callback first replays any settlement
/// writes (review enqueue, order payment mark) a failed earlier callback
/// left unfinished, so a retried callback always converges on a fully
/// settled order. Patient visibility flips inside the same committed unit
/// as the `Paid` transition, never as a separate step, so
/// `visible_to_patient` can only ever be observed alongside a paid status.
pub struct PaymentGate {
    store: Arc<WorkflowStore>,
    queue: Arc<ReviewQueueManager>,
}

impl PaymentGate {
    pub fn new(store: Arc<WorkflowStore>, queue: Arc<ReviewQueueManager>) -> Self {
        Self { store, queue }
    }

    /// Confirms payment for a prescription.
    ///
    /// On fresh confirmation: commits the transition to `Paid` together
    /// with the visibility flip, enqueues the prescription for the assigned
    /// doctor, and records the payment on the order. A duplicate callback
    /// gets `WorkflowError::AlreadyProcessed` after repairing any
    /// settlement writes a failed earlier callback left behind.
    pub async fn confirm_payment(
        &self,
        prescription_id: &str,
        amount: f64,
        method: &str,
    ) -> Result<Prescription> {
        let current = self.store.get_prescription(prescription_id).await?;
        if current.payment_status.is_paid() {
            debug!(
                prescription_id = %prescription_id,
                "Duplicate payment callback, already paid"
            );
            self.repair_settlement(&current, method).await?;
            return Err(WorkflowError::AlreadyProcessed);
        }

        let details = PaymentDetails {
            amount,
            method: method.to_string(),
        };
        let result = self
            .store
            .update_with(
                prescription_id,
                PrescriptionStatus::Paid,
                Actor::PaymentCallback,
                None,
                Some(details),
            )
            .await;

        let updated = match result {
            Ok(updated) => updated,
            Err(WorkflowError::TransitionRejected { from, to }) => {
                // A concurrent duplicate may have won the CAS between our
                // read and the commit. If it did, this callback is a
                // duplicate too, not a rejection.
                let reread = self.store.get_prescription(prescription_id).await?;
                if reread.payment_status.is_paid() {
                    debug!(
                        prescription_id = %prescription_id,
                        "Lost payment race to concurrent callback"
                    );
                    self.repair_settlement(&reread, method).await?;
                    return Err(WorkflowError::AlreadyProcessed);
                }
                return Err(WorkflowError::transition_rejected(from, to));
            }
            Err(e) => return Err(e),
        };

        self.settle(&updated, method).await?;

        info!(
            prescription_id = %prescription_id,
            amount,
            method,
            doctor_id = %updated.doctor_id,
            "Payment confirmed, prescription visible to patient"
        );
        Ok(updated)
    }

    /// Post-commit settlement: the review enqueue, then the order payment
    /// mark. The order mark goes last so an unpaid order is the durable
    /// signal that settlement has not finished and must be replayed.
    async fn settle(&self, prescription: &Prescription, method: &str) -> Result<()> {
        self.queue
            .enqueue(
                &prescription.id,
                &prescription.doctor_id,
                PAID_REVIEW_PRIORITY,
            )
            .await?;
        self.store
            .storage()
            .mark_order_paid(&prescription.id, method)
            .await?;
        Ok(())
    }

    /// Replays settlement for a prescription that committed `Paid` but
    /// whose order is still unpaid: a prior callback failed between the
    /// commit and the settlement writes. Both writes are idempotent, so a
    /// replay changes nothing once settlement has completed.
    async fn repair_settlement(&self, prescription: &Prescription, method: &str) -> Result<()> {
        let order = self
            .store
            .storage()
            .get_order_for_prescription(&prescription.id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("order", prescription.id.clone()))?;
        if order.payment_status.is_paid() {
            return Ok(());
        }

        warn!(
            prescription_id = %prescription.id,
            "Replaying unfinished payment settlement"
        );
        self.settle(prescription, method).await
    }
}

impl std::fmt::Debug for PaymentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGate").finish()
    }
}
