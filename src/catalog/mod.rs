//! Catalog management
//!
//! Holds the university → semester → course hierarchy and its persistence.

pub mod model;
pub mod results;
pub mod store;

pub use model::{Catalog, CourseKey};
pub use results::{LoadResult, LoadSource, RemovalReport};
pub use store::CatalogStore;
