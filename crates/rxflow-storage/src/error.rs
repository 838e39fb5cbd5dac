//! Storage error types for the workflow storage abstraction layer.

use std::fmt;

use rxflow_core::PrescriptionStatus;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The referenced entity was not found.
    #[error("Not found: {entity}/{id}")]
    NotFound {
        /// The kind of entity (prescription, order, queue entry, ...).
        entity: String,
        /// The id that was looked up.
        id: String,
    },

    /// A compare-and-swap write found the status changed since it was read.
    #[error("CAS conflict: expected {expected}, found {actual}")]
    CasConflict {
        /// The status the caller observed before writing.
        expected: PrescriptionStatus,
        /// The status actually stored at write time.
        actual: PrescriptionStatus,
    },

    /// The unique index over (prescription, doctor, pending) already holds
    /// an entry for this pair.
    #[error("Duplicate pending queue entry, existing id {existing_id}")]
    DuplicatePending {
        /// Id of the entry already pending for the pair.
        existing_id: String,
    },

    /// Attempted to insert an entity that already exists.
    #[error("Already exists: {entity}/{id}")]
    AlreadyExists {
        /// The kind of entity.
        entity: String,
        /// The conflicting id.
        id: String,
    },

    /// A backend commit failed. The backend must have rolled back the whole
    /// unit; this error never means a partial write.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a new `CasConflict` error.
    #[must_use]
    pub fn cas_conflict(expected: PrescriptionStatus, actual: PrescriptionStatus) -> Self {
        Self::CasConflict { expected, actual }
    }

    /// Creates a new `DuplicatePending` error.
    #[must_use]
    pub fn duplicate_pending(existing_id: impl Into<String>) -> Self {
        Self::DuplicatePending {
            existing_id: existing_id.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a CAS conflict.
    #[must_use]
    pub fn is_cas_conflict(&self) -> bool {
        matches!(self, Self::CasConflict { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::CasConflict { .. } => ErrorCategory::Conflict,
            Self::DuplicatePending { .. } => ErrorCategory::Conflict,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::Backend { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Entity not found.
    NotFound,
    /// Conflict (CAS, uniqueness, or existence).
    Conflict,
    /// Infrastructure/backend error.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("prescription", "rx-1");
        assert_eq!(err.to_string(), "Not found: prescription/rx-1");

        let err = StorageError::cas_conflict(
            PrescriptionStatus::Paid,
            PrescriptionStatus::DecoctionSubmitted,
        );
        assert_eq!(
            err.to_string(),
            "CAS conflict: expected PAID, found DECOCTION_SUBMITTED"
        );

        let err = StorageError::duplicate_pending("entry-1");
        assert_eq!(
            err.to_string(),
            "Duplicate pending queue entry, existing id entry-1"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found("order", "o-1");
        assert!(err.is_not_found());
        assert!(!err.is_cas_conflict());

        let err =
            StorageError::cas_conflict(PrescriptionStatus::Pending, PrescriptionStatus::Approved);
        assert!(err.is_cas_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("prescription", "rx-1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::cas_conflict(PrescriptionStatus::Paid, PrescriptionStatus::Completed)
                .category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::duplicate_pending("entry-1").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::backend("disk full").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
