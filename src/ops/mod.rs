//! Save/load operations and the per-resource scheduler.

mod operation;
pub mod scheduler;

pub use operation::{Operation, OperationHandle, OperationKind, OperationStatus, ResourceKey};
pub use scheduler::Scheduler;
