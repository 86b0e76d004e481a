pub mod marker;
pub mod state;

pub use marker::RunMarkerStore;
pub use state::{StateStore, CHANGES_FILE, FULL_FILE, VERSION_FILE};
