//! In-memory storage backend for the rxflow workflow engine.
//!
//! Used by tests and development deployments. Implements the full
//! `WorkflowStorage` contract, including CAS transition commits and the
//! storage-level uniqueness constraint on pending review queue entries.

pub mod storage;

pub use storage::InMemoryWorkflowStorage;
