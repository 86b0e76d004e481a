pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod publish;
pub mod service;
pub mod storage;

pub use config::AppConfig;
pub use db::{create_pool, CatalogSource, PgCatalogSource};
pub use error::{RunStage, SyncError};
pub use publish::{ArtifactPublisher, DrivePublisher};
pub use service::{ChangeAccumulator, RunCoordinator, RunOutcome, SnapshotBuilder, VersionStamper};
pub use storage::{RunMarkerStore, StateStore};
