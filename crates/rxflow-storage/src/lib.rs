//! Storage abstraction layer for the rxflow workflow engine.
//!
//! This crate defines the persistence boundary: the [`WorkflowStorage`]
//! trait every backend implements, the [`StorageError`] taxonomy, and the
//! [`TransitionUpdate`] atomic-unit description. Services never touch
//! backend tables directly and no backend query syntax leaks past this
//! crate's types.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::WorkflowStorage;
pub use types::{EnqueueOutcome, PaymentDetails, TransitionUpdate};
