pub mod pool;
pub mod queries;
pub mod source;

pub use pool::{create_pool, test_connection};
pub use source::{CatalogSource, PgCatalogSource};
