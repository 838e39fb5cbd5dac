//! Shared types describing storage-level units of work.

use serde::{Deserialize, Serialize};

use rxflow_core::{
    Actor, PaymentStatus, Prescription, PrescriptionStatus, StatusChangeRecord, now_utc,
};

/// Payment fields recorded as part of a transition to `Paid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub amount: f64,
    pub method: String,
}

/// Describes one atomic status transition: the status write, the
/// status-specific timestamp writes, the optional payment/visibility write,
/// and the audit record, committed together or not at all.
///
/// Backends receive this alongside the `expected` status the caller read;
/// a backend must reject the whole unit with `CasConflict` if the stored
/// status no longer equals `expected`.
#[derive(Debug, Clone)]
pub struct TransitionUpdate {
    /// Target status.
    pub to: PrescriptionStatus,
    /// Identity performing the transition, recorded in the audit row.
    pub actor: Actor,
    /// Optional human-readable reason, recorded in the audit row.
    pub reason: Option<String>,
    /// When set, the same commit marks the prescription paid and visible.
    /// Visibility is never written outside this path, which keeps
    /// `visible_to_patient == true` implying `payment_status == Paid`.
    pub payment: Option<PaymentDetails>,
}

impl TransitionUpdate {
    pub fn new(to: PrescriptionStatus, actor: Actor, reason: Option<String>) -> Self {
        Self {
            to,
            actor,
            reason,
            payment: None,
        }
    }

    /// Attach payment confirmation to this transition.
    pub fn with_payment(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }

    /// Applies this update to a prescription record in place.
    ///
    /// Shared by backends so the timestamp rules stay identical everywhere:
    /// `Approved` stamps `reviewed_at`, `PatientConfirmed` stamps
    /// `confirmed_at`, a payment-carrying update stamps payment status and
    /// visibility.
    pub fn apply(&self, prescription: &mut Prescription) {
        prescription.status = self.to;
        match self.to {
            PrescriptionStatus::Approved => {
                prescription.reviewed_at = Some(now_utc());
            }
            PrescriptionStatus::PatientConfirmed => {
                prescription.confirmed_at = Some(now_utc());
            }
            _ => {}
        }
        if self.payment.is_some() {
            prescription.payment_status = PaymentStatus::Paid;
            prescription.visible_to_patient = true;
        }
    }

    /// Builds the audit row for this transition.
    pub fn audit_record(
        &self,
        prescription_id: &str,
        from: PrescriptionStatus,
    ) -> StatusChangeRecord {
        StatusChangeRecord::new(
            prescription_id,
            from,
            self.to,
            self.actor.clone(),
            self.reason.clone(),
        )
    }
}

/// Result of a uniqueness-guarded queue insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new entry was inserted.
    Inserted(String),
    /// A pending entry already existed for the pair; its id is returned.
    AlreadyPending(String),
}

impl EnqueueOutcome {
    /// The id of the pending entry for the pair, whether fresh or existing.
    pub fn entry_id(&self) -> &str {
        match self {
            Self::Inserted(id) | Self::AlreadyPending(id) => id,
        }
    }

    /// Returns `true` if the call inserted a new entry.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxflow_core::ClinicalContent;

    fn pending_prescription() -> Prescription {
        Prescription::new("patient-1", "doctor-1", ClinicalContent::default())
    }

    #[test]
    fn test_apply_sets_status() {
        let mut rx = pending_prescription();
        let update = TransitionUpdate::new(
            PrescriptionStatus::DoctorReviewing,
            Actor::Doctor("d1".into()),
            None,
        );
        update.apply(&mut rx);
        assert_eq!(rx.status, PrescriptionStatus::DoctorReviewing);
        assert!(rx.reviewed_at.is_none());
    }

    #[test]
    fn test_apply_approved_stamps_reviewed_at() {
        let mut rx = pending_prescription();
        let update = TransitionUpdate::new(
            PrescriptionStatus::Approved,
            Actor::Doctor("d1".into()),
            None,
        );
        update.apply(&mut rx);
        assert_eq!(rx.status, PrescriptionStatus::Approved);
        assert!(rx.reviewed_at.is_some());
        assert!(rx.confirmed_at.is_none());
    }

    #[test]
    fn test_apply_confirmed_stamps_confirmed_at() {
        let mut rx = pending_prescription();
        rx.status = PrescriptionStatus::Approved;
        let update = TransitionUpdate::new(
            PrescriptionStatus::PatientConfirmed,
            Actor::Patient("p1".into()),
            None,
        );
        update.apply(&mut rx);
        assert!(rx.confirmed_at.is_some());
    }

    #[test]
    fn test_apply_payment_sets_visibility_and_paid() {
        let mut rx = pending_prescription();
        rx.status = PrescriptionStatus::PatientConfirmed;
        let update =
            TransitionUpdate::new(PrescriptionStatus::Paid, Actor::PaymentCallback, None)
                .with_payment(PaymentDetails {
                    amount: 99.0,
                    method: "wechat".into(),
                });
        update.apply(&mut rx);
        assert_eq!(rx.payment_status, PaymentStatus::Paid);
        assert!(rx.visible_to_patient);
    }

    #[test]
    fn test_apply_without_payment_leaves_visibility() {
        let mut rx = pending_prescription();
        let update = TransitionUpdate::new(
            PrescriptionStatus::Approved,
            Actor::Doctor("d1".into()),
            None,
        );
        update.apply(&mut rx);
        assert!(!rx.visible_to_patient);
        assert_eq!(rx.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_audit_record_carries_edge_and_actor() {
        let update = TransitionUpdate::new(
            PrescriptionStatus::Rejected,
            Actor::Patient("p1".into()),
            Some("patient declined".into()),
        );
        let record = update.audit_record("rx-1", PrescriptionStatus::Approved);
        assert_eq!(record.prescription_id, "rx-1");
        assert_eq!(record.from_status, PrescriptionStatus::Approved);
        assert_eq!(record.to_status, PrescriptionStatus::Rejected);
        assert_eq!(record.actor, Actor::Patient("p1".into()));
        assert_eq!(record.reason.as_deref(), Some("patient declined"));
    }

    #[test]
    fn test_enqueue_outcome_accessors() {
        let inserted = EnqueueOutcome::Inserted("e-1".into());
        assert_eq!(inserted.entry_id(), "e-1");
        assert!(inserted.is_inserted());

        let existing = EnqueueOutcome::AlreadyPending("e-2".into());
        assert_eq!(existing.entry_id(), "e-2");
        assert!(!existing.is_inserted());
    }
}
