//! Catalog service
//!
//! Composes the catalog store and the resource tree. Every catalog mutation
//! goes through here so that removals cascade to course folders and the
//! settings document is re-saved after each change.

use log::{info, warn};

use crate::catalog::{Catalog, CatalogStore, LoadSource, RemovalReport};
use crate::config::PortalConfig;
use crate::error::CatalogError;
use crate::storage::paths::{validate_name, validate_university_name};
use crate::storage::{Category, ResourceContent, ResourceFile, ResourceTree};

/// One instance per process, shared by every front-end session.
#[derive(Debug)]
pub struct CatalogService {
    store: CatalogStore,
    tree: ResourceTree,
    catalog: Catalog,
    startup_warning: Option<CatalogError>,
}

impl CatalogService {
    /// Load the catalog from `store` and serve resources from `tree`.
    pub fn open(store: CatalogStore, tree: ResourceTree) -> Self {
        let loaded = store.load();
        let startup_warning = match loaded.source {
            LoadSource::Corrupt(reason) => Some(CatalogError::CorruptStore(reason)),
            LoadSource::Disk | LoadSource::Bootstrapped => None,
        };

        Self {
            store,
            tree,
            catalog: loaded.catalog,
            startup_warning,
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::open(
            CatalogStore::new(config.settings_path()),
            ResourceTree::new(config.uploads_root(), config.max_file_size_bytes()),
        )
    }

    /// Set when the settings document was corrupt and defaults are in use.
    pub fn startup_warning(&self) -> Option<&CatalogError> {
        self.startup_warning.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    // --------------------
    // Catalog reads
    // --------------------

    pub fn universities(&self) -> &[String] {
        self.catalog.universities()
    }

    pub fn semesters(&self, university: &str) -> &[String] {
        self.catalog.semesters(university)
    }

    pub fn courses(&self, university: &str, semester: &str) -> &[String] {
        self.catalog.courses(university, semester)
    }

    /// Save the in-memory catalog.
    ///
    /// On failure the mutation stays in memory and is written by the next
    /// successful save.
    fn persist(&mut self) -> Result<(), CatalogError> {
        self.store.save(&self.catalog)?;
        self.startup_warning = None;
        Ok(())
    }

    /// Delete a course folder, recording a failure instead of returning it.
    fn remove_course_folder(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        report: &mut RemovalReport,
    ) {
        if let Err(e) = self.tree.delete_course_folder(university, semester, course) {
            warn!(
                "Leaving folder of {} ({}, {}) behind: {}",
                course, university, semester, e
            );
            report.failures.push(format!("{}: {}", course, e));
        }
        report.courses_removed += 1;
    }

    fn prune_folder(&self, university: &str, semester: Option<&str>, report: &mut RemovalReport) {
        if let Err(e) = self.tree.prune_empty(university, semester) {
            warn!("Leaving empty folder of {} behind: {}", university, e);
            report.failures.push(e.to_string());
        }
    }

    // --------------------
    // Universities
    // --------------------

    pub fn add_university(&mut self, name: &str) -> Result<(), CatalogError> {
        let name = validate_university_name(name)?;
        self.catalog.add_university(&name)?;
        info!("Added university {}", name);
        self.persist()
    }

    /// Remove a university, its semesters and courses, and their folders.
    ///
    /// Folder deletion is attempted first; its failures are reported in the
    /// returned [`RemovalReport`] and never block the catalog change.
    pub fn remove_university(&mut self, name: &str) -> Result<RemovalReport, CatalogError> {
        if !self.catalog.has_university(name) {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let mut report = RemovalReport::default();
        for semester in self.catalog.semesters(name) {
            for course in self.catalog.courses(name, semester) {
                self.remove_course_folder(name, semester, course, &mut report);
            }
            self.prune_folder(name, Some(semester), &mut report);
        }
        self.prune_folder(name, None, &mut report);

        self.catalog.remove_university(name)?;
        info!(
            "Removed university {} ({} courses)",
            name, report.courses_removed
        );
        self.persist()?;
        Ok(report)
    }

    // --------------------
    // Semesters
    // --------------------

    pub fn add_semester(&mut self, university: &str, name: &str) -> Result<(), CatalogError> {
        let name = validate_name(name)?;
        self.catalog.add_semester(university, &name)?;
        info!("Added semester {} to {}", name, university);
        self.persist()
    }

    pub fn remove_semester(
        &mut self,
        university: &str,
        name: &str,
    ) -> Result<RemovalReport, CatalogError> {
        if !self.catalog.has_semester(university, name) {
            return Err(CatalogError::NotFound(format!("{}, {}", university, name)));
        }

        let mut report = RemovalReport::default();
        for course in self.catalog.courses(university, name) {
            self.remove_course_folder(university, name, course, &mut report);
        }
        self.prune_folder(university, Some(name), &mut report);

        self.catalog.remove_semester(university, name)?;
        info!(
            "Removed semester {} of {} ({} courses)",
            name, university, report.courses_removed
        );
        self.persist()?;
        Ok(report)
    }

    // --------------------
    // Courses
    // --------------------

    /// Add a course and create its exams, sheets and tips folders.
    pub fn add_course(
        &mut self,
        university: &str,
        semester: &str,
        name: &str,
    ) -> Result<(), CatalogError> {
        let name = validate_name(name)?;
        let mut updated = self.catalog.clone();
        updated.add_course(university, semester, &name)?;

        self.tree.create_course_folders(university, semester, &name)?;
        self.catalog = updated;
        info!("Added course {} to {}, {}", name, university, semester);
        self.persist()
    }

    pub fn remove_course(
        &mut self,
        university: &str,
        semester: &str,
        name: &str,
    ) -> Result<RemovalReport, CatalogError> {
        self.require_course(university, semester, name)?;

        let mut report = RemovalReport::default();
        self.remove_course_folder(university, semester, name, &mut report);

        self.catalog.remove_course(university, semester, name)?;
        info!("Removed course {} from {}, {}", name, university, semester);
        self.persist()?;
        Ok(report)
    }

    // --------------------
    // Resources
    // --------------------

    fn require_course(
        &self,
        university: &str,
        semester: &str,
        course: &str,
    ) -> Result<(), CatalogError> {
        if self.catalog.has_course(university, semester, course) {
            Ok(())
        } else {
            Err(CatalogError::NotFound(format!(
                "{} ({}, {})",
                course, university, semester
            )))
        }
    }

    pub fn list_resources(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
    ) -> Result<Vec<ResourceFile>, CatalogError> {
        self.require_course(university, semester, course)?;
        self.tree.list_files(university, semester, course, category)
    }

    pub fn upload_resource(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ResourceFile, CatalogError> {
        self.require_course(university, semester, course)?;
        self.tree
            .upload(university, semester, course, category, filename, bytes)
    }

    pub fn read_resource(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
    ) -> Result<ResourceContent, CatalogError> {
        self.require_course(university, semester, course)?;
        self.tree
            .read(university, semester, course, category, filename)
    }

    /// Rename a resource and return its final name.
    pub fn rename_resource(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        old_name: &str,
        new_name: &str,
    ) -> Result<String, CatalogError> {
        self.require_course(university, semester, course)?;
        self.tree
            .rename(university, semester, course, category, old_name, new_name)
    }

    pub fn delete_resource(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
    ) -> Result<(), CatalogError> {
        self.require_course(university, semester, course)?;
        self.tree
            .delete(university, semester, course, category, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn service(dir: &Path) -> CatalogService {
        let store = CatalogStore::new(dir.join("settings.json"));
        store.save(&Catalog::new()).unwrap();
        CatalogService::open(store, ResourceTree::new(dir.join("uploads"), 1024 * 1024))
    }

    #[test]
    fn names_are_validated_before_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = service(dir.path());

        assert!(matches!(
            service.add_university("  "),
            Err(CatalogError::InvalidName(_))
        ));
        assert!(matches!(
            service.add_university("Uni_X"),
            Err(CatalogError::InvalidName(_))
        ));
        service.add_university(" A ").unwrap();
        assert_eq!(service.universities(), ["A"]);
    }

    #[test]
    fn course_resources_require_catalog_entry() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        assert!(matches!(
            service.upload_resource("A", "S1", "C1", Category::Exams, "a.pdf", b"x"),
            Err(CatalogError::NotFound(_))
        ));
        assert!(!dir.path().join("uploads/A").exists());
    }

    #[test]
    fn failed_folder_creation_leaves_catalog_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = service(dir.path());
        service.add_university("A").unwrap();
        service.add_semester("A", "S1").unwrap();

        // A regular file where the semester folder should be.
        std::fs::create_dir_all(dir.path().join("uploads/A")).unwrap();
        std::fs::write(dir.path().join("uploads/A/S1"), b"").unwrap();

        assert!(matches!(
            service.add_course("A", "S1", "C1"),
            Err(CatalogError::WriteError(_))
        ));
        assert!(service.courses("A", "S1").is_empty());
    }

    #[test]
    fn store_failure_keeps_mutation_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = service(dir.path());

        // Replace the document's directory entry with a directory so rename fails.
        std::fs::remove_file(dir.path().join("settings.json")).unwrap();
        std::fs::create_dir(dir.path().join("settings.json")).unwrap();
        std::fs::write(dir.path().join("settings.json/keep"), b"").unwrap();

        assert!(matches!(
            service.add_university("A"),
            Err(CatalogError::StoreError(_))
        ));
        assert_eq!(service.universities(), ["A"]);
    }

    #[test]
    fn corrupt_store_is_reported_until_next_save() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "[1, 2").unwrap();
        let mut service = CatalogService::open(
            CatalogStore::new(dir.path().join("settings.json")),
            ResourceTree::new(dir.path().join("uploads"), 1024),
        );

        assert!(matches!(
            service.startup_warning(),
            Some(CatalogError::CorruptStore(_))
        ));
        assert_eq!(service.catalog(), &Catalog::bootstrap());

        service.add_university("B").unwrap();
        assert!(service.startup_warning().is_none());
    }
}
