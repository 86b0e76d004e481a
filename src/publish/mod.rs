pub mod drive;

pub use drive::{ArtifactPublisher, DrivePublisher};
