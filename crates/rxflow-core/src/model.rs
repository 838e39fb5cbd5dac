//! Persisted domain records for the prescription fulfillment workflow.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::generate_id;
use crate::status::PrescriptionStatus;
use crate::time::{WorkflowDateTime, now_utc};

/// Payment state of a prescription's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

/// The identity performing a transition, attached to every audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Doctor(String),
    Patient(String),
    PaymentCallback,
    Dispatcher,
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctor(id) => write!(f, "doctor:{id}"),
            Self::Patient(id) => write!(f, "patient:{id}"),
            Self::PaymentCallback => write!(f, "payment_callback"),
            Self::Dispatcher => write!(f, "dispatcher"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Clinical payload of a prescription: the AI draft plus the doctor's edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalContent {
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(rename = "aiDraft", default)]
    pub ai_draft: String,
    #[serde(rename = "doctorDraft", skip_serializing_if = "Option::is_none")]
    pub doctor_draft: Option<String>,
}

/// The clinical record tracked through the fulfillment lifecycle.
///
/// Created by the AI-drafting collaborator in `Pending`, hidden from the
/// patient until payment confirms. Never deleted; terminal at `Completed`
/// or abandoned at `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "doctorId")]
    pub doctor_id: String,
    pub content: ClinicalContent,
    pub status: PrescriptionStatus,
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "visibleToPatient")]
    pub visible_to_patient: bool,
    #[serde(rename = "createdAt")]
    pub created_at: WorkflowDateTime,
    #[serde(rename = "reviewedAt", skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<WorkflowDateTime>,
    #[serde(rename = "confirmedAt", skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<WorkflowDateTime>,
}

impl Prescription {
    /// Creates a new prescription in the initial state: `Pending`, payment
    /// pending, content hidden from the patient.
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        content: ClinicalContent,
    ) -> Self {
        Self {
            id: generate_id(),
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            content,
            status: PrescriptionStatus::INITIAL,
            payment_status: PaymentStatus::Pending,
            visible_to_patient: false,
            created_at: now_utc(),
            reviewed_at: None,
            confirmed_at: None,
        }
    }
}

/// One active order per prescription, carrying payment state and the
/// decoction flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "prescriptionId")]
    pub prescription_id: String,
    pub amount: f64,
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "paymentMethod", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(rename = "decoctionRequired")]
    pub decoction_required: bool,
    #[serde(rename = "createdAt")]
    pub created_at: WorkflowDateTime,
    #[serde(rename = "paidAt", skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<WorkflowDateTime>,
}

impl Order {
    pub fn new(prescription_id: impl Into<String>, amount: f64, decoction_required: bool) -> Self {
        Self {
            id: generate_id(),
            prescription_id: prescription_id.into(),
            amount,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            decoction_required,
            created_at: now_utc(),
            paid_at: None,
        }
    }
}

/// Status of a review queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEntryStatus {
    Pending,
    Completed,
}

/// One item in a doctor's review backlog.
///
/// At most one `Pending` entry may exist per (prescription, doctor) pair;
/// the storage backend enforces that with a unique index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQueueEntry {
    pub id: String,
    #[serde(rename = "prescriptionId")]
    pub prescription_id: String,
    #[serde(rename = "doctorId")]
    pub doctor_id: String,
    pub status: QueueEntryStatus,
    /// Higher priority dequeues first; ties resolve to earliest submission.
    pub priority: u8,
    #[serde(rename = "submittedAt")]
    pub submitted_at: WorkflowDateTime,
    #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<WorkflowDateTime>,
    #[serde(rename = "completedReason", skip_serializing_if = "Option::is_none")]
    pub completed_reason: Option<String>,
}

impl ReviewQueueEntry {
    pub fn new(
        prescription_id: impl Into<String>,
        doctor_id: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            id: generate_id(),
            prescription_id: prescription_id.into(),
            doctor_id: doctor_id.into(),
            status: QueueEntryStatus::Pending,
            priority,
            submitted_at: now_utc(),
            completed_at: None,
            completed_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, QueueEntryStatus::Pending)
    }
}

/// Fulfillment status of a decoction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoctionStatus {
    Submitted,
    Preparing,
    Shipped,
    Delivered,
}

/// Downstream fulfillment record routed to an herbal-preparation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoctionOrder {
    pub id: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "prescriptionId")]
    pub prescription_id: String,
    /// Generated unique order number (timestamp + random suffix).
    #[serde(rename = "orderNumber")]
    pub order_number: String,
    /// Provider is "unassigned" until later routing picks one.
    pub provider: String,
    pub status: DecoctionStatus,
    #[serde(rename = "createdAt")]
    pub created_at: WorkflowDateTime,
}

impl DecoctionOrder {
    pub fn new(
        order_id: impl Into<String>,
        prescription_id: impl Into<String>,
        order_number: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            order_id: order_id.into(),
            prescription_id: prescription_id.into(),
            order_number: order_number.into(),
            provider: "unassigned".to_string(),
            status: DecoctionStatus::Submitted,
            created_at: now_utc(),
        }
    }
}

/// One append-only row per committed status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    pub id: String,
    #[serde(rename = "prescriptionId")]
    pub prescription_id: String,
    #[serde(rename = "fromStatus")]
    pub from_status: PrescriptionStatus,
    #[serde(rename = "toStatus")]
    pub to_status: PrescriptionStatus,
    pub actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: WorkflowDateTime,
}

impl StatusChangeRecord {
    pub fn new(
        prescription_id: impl Into<String>,
        from_status: PrescriptionStatus,
        to_status: PrescriptionStatus,
        actor: Actor,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            prescription_id: prescription_id.into(),
            from_status,
            to_status,
            actor,
            reason,
            timestamp: now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_content() -> ClinicalContent {
        ClinicalContent {
            symptoms: "fatigue, poor sleep".to_string(),
            diagnosis: "qi deficiency".to_string(),
            ai_draft: "astragalus 15g, jujube 10g".to_string(),
            doctor_draft: None,
        }
    }

    #[test]
    fn test_prescription_initial_state() {
        let rx = Prescription::new("patient-1", "doctor-1", sample_content());

        assert_eq!(rx.status, PrescriptionStatus::Pending);
        assert_eq!(rx.payment_status, PaymentStatus::Pending);
        assert!(!rx.visible_to_patient);
        assert!(rx.reviewed_at.is_none());
        assert!(rx.confirmed_at.is_none());
        assert!(uuid::Uuid::parse_str(&rx.id).is_ok());
    }

    #[test]
    fn test_prescription_serialization_field_names() {
        let rx = Prescription::new("patient-1", "doctor-1", sample_content());
        let json = serde_json::to_value(&rx).unwrap();

        assert_eq!(json["patientId"], "patient-1");
        assert_eq!(json["doctorId"], "doctor-1");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["paymentStatus"], "pending");
        assert_eq!(json["visibleToPatient"], false);
        assert!(json["createdAt"].is_string());
        assert!(json.get("reviewedAt").is_none());
    }

    #[test]
    fn test_prescription_deserialization() {
        let json = json!({
            "id": "rx-1",
            "patientId": "patient-9",
            "doctorId": "doctor-3",
            "content": {
                "symptoms": "cough",
                "diagnosis": "wind-cold",
                "aiDraft": "draft"
            },
            "status": "APPROVED",
            "paymentStatus": "pending",
            "visibleToPatient": false,
            "createdAt": "2024-06-01T10:00:00Z",
            "reviewedAt": "2024-06-01T11:00:00Z"
        });

        let rx: Prescription = serde_json::from_value(json).unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Approved);
        assert!(rx.reviewed_at.is_some());
        assert!(rx.confirmed_at.is_none());
    }

    #[test]
    fn test_order_creation() {
        let order = Order::new("rx-1", 128.5, true);
        assert_eq!(order.prescription_id, "rx-1");
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.decoction_required);
        assert!(order.paid_at.is_none());
    }

    #[test]
    fn test_queue_entry_creation() {
        let entry = ReviewQueueEntry::new("rx-1", "doctor-1", 5);
        assert!(entry.is_pending());
        assert_eq!(entry.priority, 5);
        assert!(entry.completed_at.is_none());
        assert!(entry.completed_reason.is_none());
    }

    #[test]
    fn test_decoction_order_defaults() {
        let order = DecoctionOrder::new("order-1", "rx-1", "DO17175300000001ab");
        assert_eq!(order.provider, "unassigned");
        assert_eq!(order.status, DecoctionStatus::Submitted);
    }

    #[test]
    fn test_actor_display() {
        assert_eq!(Actor::Doctor("d1".into()).to_string(), "doctor:d1");
        assert_eq!(Actor::Patient("p1".into()).to_string(), "patient:p1");
        assert_eq!(Actor::PaymentCallback.to_string(), "payment_callback");
        assert_eq!(Actor::Dispatcher.to_string(), "dispatcher");
        assert_eq!(Actor::System.to_string(), "system");
    }

    #[test]
    fn test_actor_serde_round_trip() {
        let actors = [
            Actor::Doctor("d1".into()),
            Actor::Patient("p1".into()),
            Actor::PaymentCallback,
            Actor::Dispatcher,
            Actor::System,
        ];
        for actor in actors {
            let json = serde_json::to_string(&actor).unwrap();
            let back: Actor = serde_json::from_str(&json).unwrap();
            assert_eq!(actor, back);
        }
    }

    #[test]
    fn test_status_change_record() {
        let record = StatusChangeRecord::new(
            "rx-1",
            PrescriptionStatus::Pending,
            PrescriptionStatus::Approved,
            Actor::Doctor("d1".into()),
            Some("looks good".into()),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["prescriptionId"], "rx-1");
        assert_eq!(json["fromStatus"], "PENDING");
        assert_eq!(json["toStatus"], "APPROVED");
        assert_eq!(json["reason"], "looks good");
    }

    #[test]
    fn test_payment_status_is_paid() {
        assert!(PaymentStatus::Paid.is_paid());
        assert!(!PaymentStatus::Pending.is_paid());
        assert!(!PaymentStatus::Refunded.is_paid());
    }

    #[test]
    fn test_clinical_content_optional_doctor_draft() {
        let content = sample_content();
        let json = serde_json::to_value(&content).unwrap();
        assert!(json.get("doctorDraft").is_none());

        let edited = ClinicalContent {
            doctor_draft: Some("astragalus 20g".to_string()),
            ..content
        };
        let json = serde_json::to_value(&edited).unwrap();
        assert_eq!(json["doctorDraft"], "astragalus 20g");
    }
}
