//! Prescription fulfillment workflow engine.
//!
//! The engine governs a clinical order from AI draft through doctor review,
//! patient confirmation, payment, optional decoction fulfillment, and
//! completion. Every status mutation is validated against the transition
//! table in `rxflow-core`, committed as one atomic storage unit together
//! with its audit record, and announced on a fire-and-forget event channel.
//!
//! Services are explicitly constructed around an injected
//! [`WorkflowStorage`](rxflow_storage::WorkflowStorage) handle; there is no
//! process-wide state, so tests run against the in-memory backend.

pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod payment;
pub mod queue;
pub mod store;

pub use audit::AuditLogger;
pub use config::{ConfigError, EngineConfig};
pub use dispatcher::{DispatchReport, FulfillmentDispatcher};
pub use engine::WorkflowEngine;
pub use error::{Result, WorkflowError};
pub use payment::PaymentGate;
pub use queue::ReviewQueueManager;
pub use store::{PrescriptionDraft, WorkflowStore};
