pub mod product;
pub mod version;

pub use product::{ProductRecord, RawProductRow};
pub use version::VersionInfo;
