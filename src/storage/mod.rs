//! File system storage management
//!
//! Handles course folder resolution, path validation and resource files.

pub mod paths;
pub mod resources;
pub mod results;

pub use paths::{resolve, sanitize_component};
pub use resources::ResourceTree;
pub use results::{Category, FileKind, ResourceContent, ResourceFile};
