//! FulfillmentDispatcher - periodic sweep over paid prescriptions.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::error::{Result, WorkflowError};
use crate::store::WorkflowStore;
use rxflow_core::{Actor, DecoctionOrder, Order, PrescriptionStatus, generate_order_number};

/// Outcome of one dispatcher sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Prescriptions moved to `DecoctionSubmitted` or `Completed`.
    pub advanced: usize,
    /// Prescriptions excluded on re-read (already advanced, or order not
    /// actually paid).
    pub skipped: usize,
    /// Prescriptions whose processing failed; logged and left for the next
    /// sweep.
    pub failed: usize,
}

/// Advances paid prescriptions to decoction or completion.
///
/// Each prescription is an isolated unit of work: its state is re-read and
/// re-validated immediately before mutating, a failure is logged and
/// skipped without aborting the batch, and no lock is held across the
/// sweep. Repeated runs are idempotent because the scan predicate excludes
/// anything already advanced out of `Paid`.
pub struct FulfillmentDispatcher {
    store: Arc<WorkflowStore>,
    batch_size: usize,
}

impl FulfillmentDispatcher {
    pub fn new(store: Arc<WorkflowStore>, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    /// Periodic sweep loop for the scheduled-job runner.
    pub async fn run(&self, poll_interval: Duration) {
        let mut ticker = interval(poll_interval);

        info!("Fulfillment dispatcher started");

        loop {
            ticker.tick().await;

            match self.auto_process_paid().await {
                Ok(report) => {
                    if report.advanced > 0 || report.failed > 0 {
                        info!(
                            advanced = report.advanced,
                            skipped = report.skipped,
                            failed = report.failed,
                            "Dispatcher sweep finished"
                        );
                    }
                }
                Err(e) => {
                    error!(error = %e, "Dispatcher sweep failed to scan");
                }
            }
        }
    }

    /// Sweeps prescriptions currently in `Paid` and advances each one.
    pub async fn auto_process_paid(&self) -> Result<DispatchReport> {
        let paid = self
            .store
            .storage()
            .list_prescriptions_by_status(PrescriptionStatus::Paid)
            .await?;

        let mut report = DispatchReport::default();
        for prescription in paid.into_iter().take(self.batch_size) {
            match self.process_one(&prescription.id).await {
                Ok(true) => report.advanced += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(
                        prescription_id = %prescription.id,
                        error = %e,
                        "Failed to process paid prescription, skipping"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Advances a single prescription. Returns `Ok(false)` when the re-read
    /// excludes it (manually advanced between scan and mutate, or payment
    /// not actually confirmed on the order).
    async fn process_one(&self, prescription_id: &str) -> Result<bool> {
        let prescription = self.store.get_prescription(prescription_id).await?;
        if prescription.status != PrescriptionStatus::Paid {
            debug!(
                prescription_id = %prescription_id,
                status = %prescription.status,
                "Advanced since scan, excluding"
            );
            return Ok(false);
        }

        let order = self
            .store
            .storage()
            .get_order_for_prescription(prescription_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("order", prescription_id))?;

        if !order.payment_status.is_paid() {
            warn!(
                prescription_id = %prescription_id,
                "Prescription PAID but order unpaid, excluding"
            );
            return Ok(false);
        }

        let (target, decoction) = if order.decoction_required {
            let decoction = self.ensure_decoction_order(&order, prescription_id).await?;
            (PrescriptionStatus::DecoctionSubmitted, Some(decoction))
        } else {
            (PrescriptionStatus::Completed, None)
        };

        match self
            .store
            .update_status(prescription_id, target, Actor::Dispatcher, None)
            .await
        {
            Ok(_) => {}
            // Another actor advanced it between our re-read and the commit;
            // the item is simply no longer ours.
            Err(WorkflowError::TransitionRejected { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }

        if let Some(decoction) = decoction {
            info!(
                prescription_id = %prescription_id,
                order_number = %decoction.order_number,
                "Decoction order submitted"
            );
        } else {
            info!(
                prescription_id = %prescription_id,
                "Completed without decoction"
            );
        }

        Ok(true)
    }

    /// Returns the prescription's decoction order, creating it if none
    /// exists yet. Runs before the status commit: a `DecoctionSubmitted`
    /// prescription therefore always has its decoction order, and a failure
    /// between the insert and the commit leaves the prescription in `Paid`,
    /// where the next sweep finds the existing order instead of creating a
    /// second one.
    async fn ensure_decoction_order(
        &self,
        order: &Order,
        prescription_id: &str,
    ) -> Result<DecoctionOrder> {
        let existing = self
            .store
            .storage()
            .list_decoction_orders(prescription_id)
            .await?;
        if let Some(found) = existing.into_iter().next() {
            return Ok(found);
        }

        let decoction = DecoctionOrder::new(&order.id, prescription_id, generate_order_number());
        self.store
            .storage()
            .insert_decoction_order(&decoction)
            .await?;
        Ok(decoction)
    }
}

impl std::fmt::Debug for FulfillmentDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentDispatcher")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
