//! Catalog store
//!
//! Persists the catalog as one JSON document and bootstraps a sample catalog
//! on first run.

use log::{error, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::catalog::model::Catalog;
use crate::catalog::results::{LoadResult, LoadSource};
use crate::error::CatalogError;

/// Settings document on disk
///
/// Saves within one process are serialized; separate processes editing the
/// same document can still overwrite each other's changes.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog.
    ///
    /// A missing document is created from the sample catalog. An unreadable
    /// one is reported as [`LoadSource::Corrupt`] and the sample catalog is
    /// returned without being written, leaving the broken file for inspection.
    pub fn load(&self) -> LoadResult {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let catalog = Catalog::bootstrap();
                match self.save(&catalog) {
                    Ok(()) => info!("Created default settings at {}", self.path.display()),
                    Err(e) => warn!("Using default settings without saving them: {}", e),
                }
                return LoadResult {
                    catalog,
                    source: LoadSource::Bootstrapped,
                };
            }
            Err(e) => return self.corrupt(e.to_string()),
        };

        match serde_json::from_str::<Catalog>(&text) {
            Ok(catalog) => {
                info!(
                    "Loaded settings from {} ({} universities)",
                    self.path.display(),
                    catalog.universities().len()
                );
                LoadResult {
                    catalog,
                    source: LoadSource::Disk,
                }
            }
            Err(e) => self.corrupt(e.to_string()),
        }
    }

    fn corrupt(&self, reason: String) -> LoadResult {
        warn!(
            "Settings at {} are unreadable, using defaults in memory: {}",
            self.path.display(),
            reason
        );
        LoadResult {
            catalog: Catalog::bootstrap(),
            source: LoadSource::Corrupt(reason),
        }
    }

    /// Overwrite the document with `catalog`.
    ///
    /// The JSON is written to a sibling temporary file and renamed over the
    /// document, so readers see either the old or the new catalog.
    pub fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.write_atomically(catalog).map_err(|e| {
            error!("Failed to save settings to {}: {}", self.path.display(), e);
            CatalogError::StoreError(e)
        })
    }

    fn write_atomically(&self, catalog: &Catalog) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        catalog.serialize(&mut serializer)?;

        let temp_path = self.path.with_extension("json.tmp");
        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(&buffer)?;
            file.flush()?;
            file.sync_all()
        });

        if let Err(e) = written.and_then(|_| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_bootstrap_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("data/settings.json"));

        let loaded = store.load();
        assert_eq!(loaded.source, LoadSource::Bootstrapped);
        assert_eq!(loaded.catalog, Catalog::bootstrap());
        assert!(store.path().is_file());

        let reloaded = store.load();
        assert_eq!(reloaded.source, LoadSource::Disk);
        assert_eq!(reloaded.catalog, Catalog::bootstrap());
    }

    #[test]
    fn corrupt_document_falls_back_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = CatalogStore::new(&path).load();
        assert!(matches!(loaded.source, LoadSource::Corrupt(_)));
        assert_eq!(loaded.catalog, Catalog::bootstrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn ambiguous_course_key_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let raw = r#"{"universities":["B","B_x"],"semesters":{"B":["x_y"],"B_x":["y"]},"courses":{"B_x_y":["C"]}}"#;
        fs::write(&path, raw).unwrap();

        let loaded = CatalogStore::new(&path).load();
        assert!(matches!(loaded.source, LoadSource::Corrupt(ref reason) if reason.contains("B_x_y")));
        assert_eq!(loaded.catalog, Catalog::bootstrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), raw);
    }

    #[test]
    fn save_round_trips_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("settings.json"));

        let mut catalog = Catalog::new();
        catalog.add_university("A").unwrap();
        catalog.add_semester("A", "S1").unwrap();
        catalog.add_course("A", "S1", "C1").unwrap();
        store.save(&catalog).unwrap();

        assert_eq!(store.load().catalog, catalog);
        assert!(!dir.path().join("settings.json.tmp").exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["universities"], serde_json::json!(["A"]));
        assert_eq!(raw["semesters"], serde_json::json!({ "A": ["S1"] }));
        assert_eq!(raw["courses"], serde_json::json!({ "A_S1": ["C1"] }));
    }

    #[test]
    fn save_failure_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("data");
        fs::write(&blocker, b"").unwrap();
        let store = CatalogStore::new(blocker.join("settings.json"));

        assert!(matches!(
            store.save(&Catalog::new()),
            Err(CatalogError::StoreError(_))
        ));
    }
}
