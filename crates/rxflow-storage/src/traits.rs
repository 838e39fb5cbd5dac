//! Storage traits for the workflow storage abstraction layer.
//!
//! This module defines the contract every storage backend must implement.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{EnqueueOutcome, TransitionUpdate};
use rxflow_core::{
    DecoctionOrder, Order, Prescription, PrescriptionStatus, ReviewQueueEntry, StatusChangeRecord,
};

/// The persistence boundary for prescriptions, orders, queue entries,
/// decoction orders, and the audit log.
///
/// Implementations must be thread-safe (`Send + Sync`). Two contracts carry
/// the engine's whole concurrency discipline:
///
/// - [`commit_transition`](WorkflowStorage::commit_transition) is a
///   compare-and-swap over the prescription's status and commits the status
///   write, timestamp writes, and audit append as one unit.
/// - [`insert_queue_entry_unique`](WorkflowStorage::insert_queue_entry_unique)
///   enforces at most one pending entry per (prescription, doctor) pair at
///   the storage layer, closing races between concurrent submissions.
///
/// # Example
///
/// ```ignore
/// use rxflow_storage::{WorkflowStorage, StorageError};
///
/// async fn status_of(
///     storage: &dyn WorkflowStorage,
///     id: &str,
/// ) -> Result<rxflow_core::PrescriptionStatus, StorageError> {
///     let rx = storage
///         .get_prescription(id)
///         .await?
///         .ok_or_else(|| StorageError::not_found("prescription", id))?;
///     Ok(rx.status)
/// }
/// ```
#[async_trait]
pub trait WorkflowStorage: Send + Sync {
    // ==================== Prescriptions ====================

    /// Inserts a freshly created prescription.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the id is already stored.
    async fn insert_prescription(&self, prescription: &Prescription) -> Result<(), StorageError>;

    /// Reads a prescription by id. Returns `None` if absent.
    async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>, StorageError>;

    /// Lists prescriptions currently in the given status.
    ///
    /// This is the dispatcher's scan predicate; items advanced out of the
    /// status disappear from the result on the next call.
    async fn list_prescriptions_by_status(
        &self,
        status: PrescriptionStatus,
    ) -> Result<Vec<Prescription>, StorageError>;

    /// Commits one status transition atomically.
    ///
    /// Compares the stored status against `expected`, then applies `update`
    /// (status, conditional timestamps, optional payment/visibility) and
    /// appends the audit record. Either everything persists or nothing does.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown prescription.
    /// Returns `StorageError::CasConflict` if the stored status no longer
    /// equals `expected`; nothing is written in that case.
    async fn commit_transition(
        &self,
        id: &str,
        expected: PrescriptionStatus,
        update: TransitionUpdate,
    ) -> Result<Prescription, StorageError>;

    // ==================== Orders ====================

    /// Inserts the order linked to a prescription.
    async fn insert_order(&self, order: &Order) -> Result<(), StorageError>;

    /// Reads the active order for a prescription. Returns `None` if absent.
    async fn get_order_for_prescription(
        &self,
        prescription_id: &str,
    ) -> Result<Option<Order>, StorageError>;

    /// Marks the prescription's order paid and stamps `paid_at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the prescription has no order.
    async fn mark_order_paid(
        &self,
        prescription_id: &str,
        method: &str,
    ) -> Result<Order, StorageError>;

    // ==================== Review queue ====================

    /// Inserts a queue entry, guarded by the unique index over
    /// (prescription_id, doctor_id, pending).
    ///
    /// Never fails on a duplicate: the existing pending entry's id is
    /// returned as `EnqueueOutcome::AlreadyPending`.
    async fn insert_queue_entry_unique(
        &self,
        entry: ReviewQueueEntry,
    ) -> Result<EnqueueOutcome, StorageError>;

    /// Reads a queue entry by id. Returns `None` if absent.
    async fn get_queue_entry(
        &self,
        entry_id: &str,
    ) -> Result<Option<ReviewQueueEntry>, StorageError>;

    /// Lists the pending entries for a doctor, in storage order.
    ///
    /// Callers are responsible for presentation ordering.
    async fn list_queue_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<ReviewQueueEntry>, StorageError>;

    /// Marks an entry completed with an optional reason.
    ///
    /// Completing an already-completed entry is an idempotent no-op that
    /// returns the stored entry unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown entry id.
    async fn complete_queue_entry(
        &self,
        entry_id: &str,
        reason: Option<&str>,
    ) -> Result<ReviewQueueEntry, StorageError>;

    /// Lists the pending entries referencing a prescription, any doctor.
    async fn pending_entries_for_prescription(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<ReviewQueueEntry>, StorageError>;

    // ==================== Decoction orders ====================

    /// Inserts a decoction order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the generated order number
    /// collides with a stored one.
    async fn insert_decoction_order(&self, order: &DecoctionOrder) -> Result<(), StorageError>;

    /// Lists decoction orders for a prescription.
    async fn list_decoction_orders(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<DecoctionOrder>, StorageError>;

    // ==================== Audit ====================

    /// Appends an audit record outside a transition commit.
    ///
    /// Transition commits append their own record inside
    /// [`commit_transition`](WorkflowStorage::commit_transition); this entry
    /// point exists for records not tied to a status write.
    async fn append_audit(&self, record: StatusChangeRecord) -> Result<(), StorageError>;

    /// Returns the audit history for a prescription, oldest first.
    async fn audit_history(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<StatusChangeRecord>, StorageError>;

    // ==================== Metadata ====================

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that WorkflowStorage is object-safe
    fn _assert_storage_object_safe(_: &dyn WorkflowStorage) {}
}
