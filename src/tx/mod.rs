pub mod events;
pub mod operation;
pub mod tracker;

pub use operation::{Operation, OperationKind};
pub use tracker::{OperationTracker, Phase, PollOutcome, TrackedPoll};
