//! Fire-and-forget workflow event system.
//!
//! Every committed status transition emits a `WorkflowEvent` on the
//! `EventBroadcaster` (a `tokio::sync::broadcast` channel). The device-sync
//! collaborator subscribes to mirror state to clients; the engine never
//! depends on or waits for delivery.

pub mod broadcaster;
pub mod types;

pub use broadcaster::EventBroadcaster;
pub use types::{StatusChangedEvent, WorkflowEvent};
