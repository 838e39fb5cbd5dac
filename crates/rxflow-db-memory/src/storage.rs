//! In-memory workflow storage.
//!
//! All tables live behind a single `tokio::sync::RwLock`, so a write guard
//! spans every table at once. That is what makes `commit_transition`
//! (status write + timestamps + audit append) and
//! `insert_queue_entry_unique` (index check + insert) genuinely atomic:
//! concurrent writers serialize on the guard, and a loser of a status race
//! observes the winner's write and gets `CasConflict`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use rxflow_core::{
    DecoctionOrder, Order, PaymentStatus, Prescription, PrescriptionStatus, QueueEntryStatus,
    ReviewQueueEntry, StatusChangeRecord, now_utc,
};
use rxflow_storage::{EnqueueOutcome, StorageError, TransitionUpdate, WorkflowStorage};

/// Unique-index key over (prescription_id, doctor_id) for pending entries.
type PendingPairKey = (String, String);

#[derive(Debug, Default)]
struct Tables {
    prescriptions: HashMap<String, Prescription>,
    /// Orders keyed by prescription id: one active order per prescription.
    orders: HashMap<String, Order>,
    queue: HashMap<String, ReviewQueueEntry>,
    /// The storage-enforced uniqueness constraint: maps each pair with a
    /// pending entry to that entry's id.
    pending_pairs: HashMap<PendingPairKey, String>,
    decoction_orders: Vec<DecoctionOrder>,
    decoction_numbers: HashSet<String>,
    audit: Vec<StatusChangeRecord>,
}

/// In-memory `WorkflowStorage` backend.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStorage {
    tables: RwLock<Tables>,
}

impl InMemoryWorkflowStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of audit records across all prescriptions.
    ///
    /// Test introspection; not part of the `WorkflowStorage` contract.
    pub async fn audit_len(&self) -> usize {
        self.tables.read().await.audit.len()
    }

    /// Total number of decoction orders.
    ///
    /// Test introspection; not part of the `WorkflowStorage` contract.
    pub async fn decoction_count(&self) -> usize {
        self.tables.read().await.decoction_orders.len()
    }
}

#[async_trait]
impl WorkflowStorage for InMemoryWorkflowStorage {
    async fn insert_prescription(&self, prescription: &Prescription) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if tables.prescriptions.contains_key(&prescription.id) {
            return Err(StorageError::already_exists(
                "prescription",
                &prescription.id,
            ));
        }
        tables
            .prescriptions
            .insert(prescription.id.clone(), prescription.clone());
        Ok(())
    }

    async fn get_prescription(&self, id: &str) -> Result<Option<Prescription>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.prescriptions.get(id).cloned())
    }

    async fn list_prescriptions_by_status(
        &self,
        status: PrescriptionStatus,
    ) -> Result<Vec<Prescription>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .prescriptions
            .values()
            .filter(|rx| rx.status == status)
            .cloned()
            .collect())
    }

    async fn commit_transition(
        &self,
        id: &str,
        expected: PrescriptionStatus,
        update: TransitionUpdate,
    ) -> Result<Prescription, StorageError> {
        let mut tables = self.tables.write().await;

        let current = tables
            .prescriptions
            .get(id)
            .ok_or_else(|| StorageError::not_found("prescription", id))?;

        if current.status != expected {
            return Err(StorageError::cas_conflict(expected, current.status));
        }

        let mut updated = current.clone();
        update.apply(&mut updated);
        let record = update.audit_record(id, expected);

        tables.prescriptions.insert(id.to_string(), updated.clone());
        tables.audit.push(record);

        Ok(updated)
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.prescription_id) {
            return Err(StorageError::already_exists("order", &order.prescription_id));
        }
        tables
            .orders
            .insert(order.prescription_id.clone(), order.clone());
        Ok(())
    }

    async fn get_order_for_prescription(
        &self,
        prescription_id: &str,
    ) -> Result<Option<Order>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(prescription_id).cloned())
    }

    async fn mark_order_paid(
        &self,
        prescription_id: &str,
        method: &str,
    ) -> Result<Order, StorageError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(prescription_id)
            .ok_or_else(|| StorageError::not_found("order", prescription_id))?;

        order.payment_status = PaymentStatus::Paid;
        order.payment_method = Some(method.to_string());
        order.paid_at = Some(now_utc());
        Ok(order.clone())
    }

    async fn insert_queue_entry_unique(
        &self,
        entry: ReviewQueueEntry,
    ) -> Result<EnqueueOutcome, StorageError> {
        let mut tables = self.tables.write().await;
        let key = (entry.prescription_id.clone(), entry.doctor_id.clone());

        if let Some(existing_id) = tables.pending_pairs.get(&key) {
            return Ok(EnqueueOutcome::AlreadyPending(existing_id.clone()));
        }

        let id = entry.id.clone();
        tables.pending_pairs.insert(key, id.clone());
        tables.queue.insert(id.clone(), entry);
        Ok(EnqueueOutcome::Inserted(id))
    }

    async fn get_queue_entry(
        &self,
        entry_id: &str,
    ) -> Result<Option<ReviewQueueEntry>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.queue.get(entry_id).cloned())
    }

    async fn list_queue_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<ReviewQueueEntry>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .queue
            .values()
            .filter(|entry| entry.doctor_id == doctor_id && entry.is_pending())
            .cloned()
            .collect())
    }

    async fn complete_queue_entry(
        &self,
        entry_id: &str,
        reason: Option<&str>,
    ) -> Result<ReviewQueueEntry, StorageError> {
        let mut tables = self.tables.write().await;

        let entry = tables
            .queue
            .get(entry_id)
            .ok_or_else(|| StorageError::not_found("queue entry", entry_id))?
            .clone();

        // Idempotent: completing a completed entry returns it unchanged.
        if !entry.is_pending() {
            return Ok(entry);
        }

        let key = (entry.prescription_id.clone(), entry.doctor_id.clone());
        tables.pending_pairs.remove(&key);

        let stored = tables
            .queue
            .get_mut(entry_id)
            .ok_or_else(|| StorageError::not_found("queue entry", entry_id))?;
        stored.status = QueueEntryStatus::Completed;
        stored.completed_at = Some(now_utc());
        stored.completed_reason = reason.map(str::to_string);
        Ok(stored.clone())
    }

    async fn pending_entries_for_prescription(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<ReviewQueueEntry>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .queue
            .values()
            .filter(|entry| entry.prescription_id == prescription_id && entry.is_pending())
            .cloned()
            .collect())
    }

    async fn insert_decoction_order(&self, order: &DecoctionOrder) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        if tables.decoction_numbers.contains(&order.order_number) {
            return Err(StorageError::already_exists(
                "decoction order",
                &order.order_number,
            ));
        }
        tables.decoction_numbers.insert(order.order_number.clone());
        tables.decoction_orders.push(order.clone());
        Ok(())
    }

    async fn list_decoction_orders(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<DecoctionOrder>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .decoction_orders
            .iter()
            .filter(|order| order.prescription_id == prescription_id)
            .cloned()
            .collect())
    }

    async fn append_audit(&self, record: StatusChangeRecord) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        tables.audit.push(record);
        Ok(())
    }

    async fn audit_history(
        &self,
        prescription_id: &str,
    ) -> Result<Vec<StatusChangeRecord>, StorageError> {
        let tables = self.tables.read().await;
        // Push order is commit order, which keeps the history oldest first.
        Ok(tables
            .audit
            .iter()
            .filter(|record| record.prescription_id == prescription_id)
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
