pub mod error;
pub mod events;
pub mod id;
pub mod model;
pub mod status;
pub mod time;

pub use error::{CoreError, Result};
pub use id::{generate_id, generate_order_number};
pub use model::{
    Actor, ClinicalContent, DecoctionOrder, DecoctionStatus, Order, PaymentStatus, Prescription,
    QueueEntryStatus, ReviewQueueEntry, StatusChangeRecord,
};
pub use status::PrescriptionStatus;
pub use time::{WorkflowDateTime, now_utc};
