pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod service;
pub mod storage;

pub use catalog::{Catalog, CatalogStore};
pub use config::PortalConfig;
pub use error::CatalogError;
pub use server::Server;
pub use service::CatalogService;
pub use storage::{Category, ResourceTree};
