//! Prescription lifecycle states and the transition table.
//!
//! `PrescriptionStatus` is a closed enum: an unrecognized status string can
//! never be treated as a valid state, and the transition table is an
//! exhaustive `match` checked at compile time. `can_transition_to` is the
//! single source of truth consulted before every status mutation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Lifecycle state of a prescription, from AI draft through fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    /// AI draft created, awaiting doctor attention.
    Pending,
    /// A doctor has opened the prescription for review.
    DoctorReviewing,
    /// Doctor signed off on the (possibly edited) draft.
    Approved,
    /// Abandoned, either by the doctor or by the patient declining.
    Rejected,
    /// Patient accepted the approved prescription.
    PatientConfirmed,
    /// Payment confirmed; content visible to the patient from here on.
    Paid,
    /// Handed to a decoction provider.
    DecoctionSubmitted,
    /// Decoction in preparation.
    Processing,
    /// Decoction shipped.
    Shipped,
    /// Decoction delivered.
    Delivered,
    /// Terminal success state.
    Completed,
}

impl PrescriptionStatus {
    /// The state every prescription starts in.
    pub const INITIAL: PrescriptionStatus = PrescriptionStatus::Pending;

    /// Returns the legal successor states for this state.
    ///
    /// The empty slice marks a terminal state.
    pub fn successors(&self) -> &'static [PrescriptionStatus] {
        use PrescriptionStatus::*;
        match self {
            Pending => &[DoctorReviewing, Approved, Rejected],
            DoctorReviewing => &[Approved, Rejected],
            Approved => &[PatientConfirmed, Rejected],
            PatientConfirmed => &[Paid],
            Paid => &[DecoctionSubmitted, Completed],
            DecoctionSubmitted => &[Processing],
            Processing => &[Shipped],
            Shipped => &[Delivered],
            Delivered => &[Completed],
            Completed => &[],
            Rejected => &[],
        }
    }

    /// Pure transition check: is `self -> to` an edge in the table?
    pub fn can_transition_to(&self, to: PrescriptionStatus) -> bool {
        self.successors().contains(&to)
    }

    /// Validates a transition, surfacing the illegal edge as an error.
    pub fn validate_transition(&self, to: PrescriptionStatus) -> Result<()> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::illegal_transition(*self, to))
        }
    }

    /// Returns `true` for `Completed` and `Rejected`.
    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::DoctorReviewing => "DOCTOR_REVIEWING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::PatientConfirmed => "PATIENT_CONFIRMED",
            Self::Paid => "PAID",
            Self::DecoctionSubmitted => "DECOCTION_SUBMITTED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
        }
    }

    /// All states, in lifecycle order. Used by tests and diagnostics.
    pub fn all() -> &'static [PrescriptionStatus] {
        use PrescriptionStatus::*;
        &[
            Pending,
            DoctorReviewing,
            Approved,
            Rejected,
            PatientConfirmed,
            Paid,
            DecoctionSubmitted,
            Processing,
            Shipped,
            Delivered,
            Completed,
        ]
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        PrescriptionStatus::all()
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| CoreError::invalid_status(s))
    }
}
