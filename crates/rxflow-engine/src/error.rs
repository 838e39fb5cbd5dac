//! Engine error taxonomy.
//!
//! Callers must be able to distinguish "this action is not allowed right
//! now" (`TransitionRejected`, `NotFound`) from "temporary failure, please
//! retry" (`ConflictRetryExhausted`, `Storage`). Backend detail is logged at
//! the point of failure and never leaks through `Storage`.

use thiserror::Error;

use rxflow_core::PrescriptionStatus;
use rxflow_storage::StorageError;

/// Errors surfaced by the workflow engine services.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The referenced entity does not exist.
    #[error("Not found: {entity}/{id}")]
    NotFound { entity: String, id: String },

    /// The requested status change is not an edge in the transition table.
    /// Recoverable: re-prompt the actor.
    #[error("Transition rejected: {from} -> {to}")]
    TransitionRejected {
        from: PrescriptionStatus,
        to: PrescriptionStatus,
    },

    /// The operation had already been performed; nothing changed.
    /// Signaled distinctly from fresh success so duplicate callbacks can be
    /// recognized.
    #[error("Already processed")]
    AlreadyProcessed,

    /// Optimistic-concurrency contention exceeded the retry budget.
    #[error("Conflict retries exhausted after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },

    /// A storage commit failed and was fully rolled back. Generic and
    /// retryable; the backend detail is in the logs, not here.
    #[error("Storage failure: {message}")]
    Storage { message: String },
}

impl WorkflowError {
    /// Create a new NotFound error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a new TransitionRejected error
    pub fn transition_rejected(from: PrescriptionStatus, to: PrescriptionStatus) -> Self {
        Self::TransitionRejected { from, to }
    }

    /// Create a new Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// A temporary failure the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConflictRetryExhausted { .. } | Self::Storage { .. }
        )
    }

    /// A validation rejection: the action is not allowed right now.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::TransitionRejected { .. } | Self::NotFound { .. })
    }

    /// An idempotent no-op on an already-performed operation.
    pub fn is_already_processed(&self) -> bool {
        matches!(self, Self::AlreadyProcessed)
    }
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => Self::NotFound { entity, id },
            // CAS conflicts are consumed by the retry loops; one reaching
            // here escaped its loop, so surface it as retryable.
            StorageError::CasConflict { .. }
            | StorageError::DuplicatePending { .. }
            | StorageError::AlreadyExists { .. }
            | StorageError::Backend { .. } => Self::Storage {
                message: "storage operation failed".to_string(),
            },
        }
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
