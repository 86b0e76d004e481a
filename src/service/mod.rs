pub mod accumulator;
pub mod coordinator;
pub mod normalizer;
pub mod snapshot;
pub mod stamper;

pub use accumulator::ChangeAccumulator;
pub use coordinator::{PublishSummary, RunCoordinator, RunOutcome};
pub use snapshot::SnapshotBuilder;
pub use stamper::VersionStamper;
