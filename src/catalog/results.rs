//! Catalog result types
//!
//! Defines result structures returned by store loads and cascading removals.

use crate::catalog::model::Catalog;

/// Where a loaded catalog came from
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// Parsed from the settings document
    Disk,
    /// No document existed; the sample catalog was written
    Bootstrapped,
    /// The document was unreadable; the sample catalog is held in memory only
    Corrupt(String),
}

/// Result of loading the settings document
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub catalog: Catalog,
    pub source: LoadSource,
}

/// Result of removing a university, semester or course
///
/// Folder failures are reported here instead of failing the removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    pub courses_removed: usize,
    pub failures: Vec<String>,
}

impl RemovalReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
