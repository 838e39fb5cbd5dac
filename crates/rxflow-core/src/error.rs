use thiserror::Error;

use crate::status::PrescriptionStatus;

/// Core error types for rxflow domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition {
        from: PrescriptionStatus,
        to: PrescriptionStatus,
    },

    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    #[error("Invalid DateTime: {0}")]
    InvalidDateTime(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Invalid record data: {message}")]
    InvalidRecord { message: String },
}

impl CoreError {
    /// Create a new IllegalTransition error
    pub fn illegal_transition(from: PrescriptionStatus, to: PrescriptionStatus) -> Self {
        Self::IllegalTransition { from, to }
    }

    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(datetime: impl Into<String>) -> Self {
        Self::InvalidDateTime(datetime.into())
    }

    /// Create a new InvalidRecord error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Check if this error is a validation error (caller mistake, recoverable)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. }
                | Self::InvalidStatus(_)
                | Self::InvalidDateTime(_)
                | Self::InvalidRecord { .. }
        )
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IllegalTransition { .. } => ErrorCategory::Transition,
            Self::InvalidStatus(_) | Self::InvalidDateTime(_) | Self::InvalidRecord { .. } => {
                ErrorCategory::Validation
            }
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::UuidError(_) => ErrorCategory::System,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transition,
    Validation,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transition => write!(f, "transition"),
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
