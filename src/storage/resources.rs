//! Resource tree
//!
//! Manages the per-course category folders (exams, sheets, tips) and the
//! files inside them: listing, upload, rename, delete and the bulk removal
//! used when a catalog node is cascade-deleted.

use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::error::CatalogError;
use crate::storage::paths::{ensure_within, resolve_checked, resolve_within, validate_filename};
use crate::storage::results::{Category, ResourceContent, ResourceFile};

const MAX_RETRIES: u32 = 3;
const PARTIAL_SUFFIX: &str = ".partial";

/// Hidden sibling an upload is written to before it is renamed into place
fn partial_name(filename: &str) -> String {
    format!(".{}{}", filename, PARTIAL_SUFFIX)
}

fn is_partial(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}

/// Keep the old extension unless the new name already carries the same one.
fn with_preserved_extension(old_name: &str, new_name: &str) -> String {
    let Some(old_ext) = Path::new(old_name).extension().and_then(|e| e.to_str()) else {
        return new_name.to_string();
    };
    let keeps_ext = Path::new(new_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(old_ext));

    if keeps_ext {
        new_name.to_string()
    } else {
        format!("{}.{}", new_name, old_ext)
    }
}

/// Retry an operation that fails with `PermissionDenied`, which on some
/// platforms is transient while another handle closes.
fn with_retries<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if attempt < MAX_RETRIES && e.kind() == io::ErrorKind::PermissionDenied => {
                thread::sleep(Duration::from_millis(100 * attempt as u64));
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn file_metadata(path: &Path, name: &str) -> io::Result<ResourceFile> {
    let metadata = fs::metadata(path)?;
    Ok(ResourceFile {
        name: name.to_string(),
        size: metadata.len(),
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    })
}

/// Filesystem side of the catalog, rooted at the uploads directory
#[derive(Debug, Clone)]
pub struct ResourceTree {
    root: PathBuf,
    max_file_size: u64,
}

impl ResourceTree {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    /// Course folder, checked to stay under the root
    pub fn course_dir(
        &self,
        university: &str,
        semester: &str,
        course: &str,
    ) -> Result<PathBuf, CatalogError> {
        resolve_checked(&self.root, university, semester, course)
    }

    fn category_dir(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
    ) -> Result<PathBuf, CatalogError> {
        Ok(self
            .course_dir(university, semester, course)?
            .join(category.dir_name()))
    }

    fn file_path(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
    ) -> Result<PathBuf, CatalogError> {
        let filename = validate_filename(filename)?;
        if filename.ends_with(PARTIAL_SUFFIX) {
            return Err(CatalogError::InvalidName(filename.to_string()));
        }
        let path = self
            .category_dir(university, semester, course, category)?
            .join(filename);
        ensure_within(&self.root, &path)?;
        Ok(path)
    }

    /// Create all three category folders of a course.
    pub fn create_course_folders(
        &self,
        university: &str,
        semester: &str,
        course: &str,
    ) -> Result<PathBuf, CatalogError> {
        let course_dir = self.course_dir(university, semester, course)?;
        for category in Category::ALL {
            fs::create_dir_all(course_dir.join(category.dir_name())).map_err(|e| {
                error!(
                    "Failed to create {} folder under {}: {}",
                    category,
                    course_dir.display(),
                    e
                );
                CatalogError::WriteError(e)
            })?;
        }
        info!("Created course folders at {}", course_dir.display());
        Ok(course_dir)
    }

    /// List the regular files of a category folder, sorted by name.
    ///
    /// The folder is created if missing, so a course that predates its
    /// folders lists as empty instead of failing.
    pub fn list_files(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
    ) -> Result<Vec<ResourceFile>, CatalogError> {
        let dir = self.category_dir(university, semester, course, category)?;
        fs::create_dir_all(&dir)?;

        let entries = with_retries(|| fs::read_dir(&dir)).map_err(|e| {
            error!("Failed to list {}: {}", dir.display(), e);
            CatalogError::WriteError(e)
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_partial(&name) {
                continue;
            }
            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => files.push(ResourceFile {
                    name,
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                }),
                Ok(_) => {}
                Err(e) => warn!("Skipping {} in {}: {}", name, dir.display(), e),
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        info!("Listed {} - {} files", dir.display(), files.len());
        Ok(files)
    }

    /// Write a file, replacing any existing file of the same name.
    ///
    /// Bytes go to a hidden partial sibling first and are renamed into place,
    /// so a concurrent listing never sees a half-written file.
    pub fn upload(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ResourceFile, CatalogError> {
        let size = bytes.len() as u64;
        if size > self.max_file_size {
            return Err(CatalogError::FileTooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        let path = self.file_path(university, semester, course, category, filename)?;
        let dir = self.category_dir(university, semester, course, category)?;
        fs::create_dir_all(&dir).map_err(CatalogError::WriteError)?;

        let partial = dir.join(partial_name(filename));
        let written = File::create(&partial).and_then(|mut file| {
            file.write_all(bytes)?;
            file.flush()?;
            file.sync_all()
        });

        if let Err(e) = written.and_then(|_| fs::rename(&partial, &path)) {
            error!("Failed to upload {}: {}", path.display(), e);
            let _ = fs::remove_file(&partial);
            return Err(CatalogError::WriteError(e));
        }

        info!("Uploaded {} ({} bytes)", path.display(), size);
        file_metadata(&path, filename).map_err(CatalogError::WriteError)
    }

    /// Read a file's bytes and metadata for download or preview.
    pub fn read(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
    ) -> Result<ResourceContent, CatalogError> {
        let path = self.file_path(university, semester, course, category, filename)?;
        if !path.is_file() {
            return Err(CatalogError::NotFound(filename.to_string()));
        }
        let bytes = fs::read(&path).map_err(CatalogError::WriteError)?;
        let file = file_metadata(&path, filename).map_err(CatalogError::WriteError)?;
        Ok(ResourceContent { file, bytes })
    }

    /// Rename a file, keeping its extension, and return the final name.
    ///
    /// Never overwrites a sibling: an existing target is `AlreadyExists`.
    pub fn rename(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        old_name: &str,
        new_name: &str,
    ) -> Result<String, CatalogError> {
        let old_path = self.file_path(university, semester, course, category, old_name)?;
        if !old_path.is_file() {
            return Err(CatalogError::NotFound(old_name.to_string()));
        }

        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(CatalogError::InvalidName(new_name.to_string()));
        }
        let final_name = with_preserved_extension(old_name, new_name);
        let new_path = self.file_path(university, semester, course, category, &final_name)?;
        if final_name == old_name {
            return Ok(final_name);
        }
        if fs::symlink_metadata(&new_path).is_ok() {
            return Err(CatalogError::AlreadyExists(final_name));
        }

        with_retries(|| fs::rename(&old_path, &new_path)).map_err(|e| {
            error!(
                "Failed to rename {} to {}: {}",
                old_path.display(),
                new_path.display(),
                e
            );
            CatalogError::WriteError(e)
        })?;

        info!("Renamed {} to {}", old_path.display(), final_name);
        Ok(final_name)
    }

    pub fn delete(
        &self,
        university: &str,
        semester: &str,
        course: &str,
        category: Category,
        filename: &str,
    ) -> Result<(), CatalogError> {
        let path = self.file_path(university, semester, course, category, filename)?;
        if !path.is_file() {
            return Err(CatalogError::NotFound(filename.to_string()));
        }

        with_retries(|| fs::remove_file(&path)).map_err(|e| {
            error!("Failed to delete {}: {}", path.display(), e);
            CatalogError::WriteError(e)
        })?;

        info!("Deleted {}", path.display());
        Ok(())
    }

    /// Remove a course's whole folder tree. Succeeds when it is already gone.
    pub fn delete_course_folder(
        &self,
        university: &str,
        semester: &str,
        course: &str,
    ) -> Result<(), CatalogError> {
        let course_dir = self.course_dir(university, semester, course)?;
        if !course_dir.exists() {
            return Ok(());
        }

        with_retries(|| fs::remove_dir_all(&course_dir)).map_err(|e| {
            error!("Failed to remove {}: {}", course_dir.display(), e);
            CatalogError::WriteError(e)
        })?;

        info!("Removed course folder {}", course_dir.display());
        Ok(())
    }

    /// Remove a university or semester folder if nothing is left inside it.
    ///
    /// Distinct names can sanitize to the same folder, so a shared ancestor
    /// is only ever removed once it is empty.
    pub fn prune_empty(&self, university: &str, semester: Option<&str>) -> Result<bool, CatalogError> {
        let dir = match semester {
            Some(semester) => resolve_within(&self.root, &[university, semester])?,
            None => resolve_within(&self.root, &[university])?,
        };

        let is_empty = match fs::read_dir(&dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(CatalogError::WriteError(e)),
        };
        if !is_empty {
            return Ok(false);
        }

        fs::remove_dir(&dir).map_err(CatalogError::WriteError)?;
        info!("Removed empty folder {}", dir.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (tempfile::TempDir, ResourceTree) {
        let dir = tempfile::tempdir().unwrap();
        let tree = ResourceTree::new(dir.path().join("uploads"), 1024);
        (dir, tree)
    }

    #[test]
    fn extension_is_preserved() {
        assert_eq!(with_preserved_extension("midterm.pdf", "midterm_v2"), "midterm_v2.pdf");
        assert_eq!(with_preserved_extension("midterm.pdf", "final.PDF"), "final.PDF");
        assert_eq!(with_preserved_extension("midterm.pdf", "final.v2"), "final.v2.pdf");
        assert_eq!(with_preserved_extension("notes", "summary"), "summary");
    }

    #[test]
    fn upload_then_list_and_read() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Exams, "midterm.pdf", b"%PDF-1.4")
            .unwrap();

        let files = tree.list_files("A", "S1", "C1", Category::Exams).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "midterm.pdf");
        assert_eq!(files[0].size, 8);

        let content = tree.read("A", "S1", "C1", Category::Exams, "midterm.pdf").unwrap();
        assert_eq!(content.bytes, b"%PDF-1.4");
    }

    #[test]
    fn upload_overwrites_same_name() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Tips, "a.txt", b"one").unwrap();
        tree.upload("A", "S1", "C1", Category::Tips, "a.txt", b"two").unwrap();

        let content = tree.read("A", "S1", "C1", Category::Tips, "a.txt").unwrap();
        assert_eq!(content.bytes, b"two");
        assert_eq!(tree.list_files("A", "S1", "C1", Category::Tips).unwrap().len(), 1);
    }

    #[test]
    fn upload_rejects_oversized_files() {
        let (_dir, tree) = tree();
        let bytes = vec![0u8; 2048];
        assert!(matches!(
            tree.upload("A", "S1", "C1", Category::Exams, "big.bin", &bytes),
            Err(CatalogError::FileTooLarge { size: 2048, limit: 1024 })
        ));
    }

    #[test]
    fn listing_is_sorted_and_skips_partials() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Sheets, "b.pdf", b"b").unwrap();
        tree.upload("A", "S1", "C1", Category::Sheets, "a.pdf", b"a").unwrap();
        let dir = tree.course_dir("A", "S1", "C1").unwrap().join("sheets");
        fs::write(dir.join(partial_name("c.pdf")), b"half").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();

        let names: Vec<_> = tree
            .list_files("A", "S1", "C1", Category::Sheets)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn listing_creates_missing_folder() {
        let (_dir, tree) = tree();
        assert!(tree.list_files("A", "S1", "C1", Category::Tips).unwrap().is_empty());
        assert!(tree.course_dir("A", "S1", "C1").unwrap().join("tips").is_dir());
    }

    #[test]
    fn rename_never_overwrites_a_sibling() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Exams, "a.pdf", b"first").unwrap();
        tree.upload("A", "S1", "C1", Category::Exams, "b.pdf", b"second").unwrap();

        assert!(matches!(
            tree.rename("A", "S1", "C1", Category::Exams, "a.pdf", "b"),
            Err(CatalogError::AlreadyExists(name)) if name == "b.pdf"
        ));
        let a = tree.read("A", "S1", "C1", Category::Exams, "a.pdf").unwrap();
        let b = tree.read("A", "S1", "C1", Category::Exams, "b.pdf").unwrap();
        assert_eq!(a.bytes, b"first");
        assert_eq!(b.bytes, b"second");
    }

    #[test]
    fn rename_to_blank_name_is_invalid() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Exams, "a.pdf", b"x").unwrap();

        for blank in ["", "   "] {
            assert!(matches!(
                tree.rename("A", "S1", "C1", Category::Exams, "a.pdf", blank),
                Err(CatalogError::InvalidName(_))
            ));
        }
        let names: Vec<_> = tree
            .list_files("A", "S1", "C1", Category::Exams)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a.pdf"]);
    }

    #[test]
    fn partial_suffix_is_reserved() {
        let (_dir, tree) = tree();
        assert!(matches!(
            tree.upload("A", "S1", "C1", Category::Tips, ".notes.pdf.partial", b"x"),
            Err(CatalogError::InvalidName(_))
        ));
        tree.upload("A", "S1", "C1", Category::Tips, "notes", b"x").unwrap();
        assert!(matches!(
            tree.rename("A", "S1", "C1", Category::Tips, "notes", ".notes.partial"),
            Err(CatalogError::InvalidName(_))
        ));
        assert!(tree.read("A", "S1", "C1", Category::Tips, "notes").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_course_folder_outside_root_is_refused() {
        let (dir, tree) = tree();
        let outside = dir.path().join("outside");
        fs::create_dir_all(outside.join("exams")).unwrap();
        let semester_dir = dir.path().join("uploads/A/S1");
        fs::create_dir_all(&semester_dir).unwrap();
        std::os::unix::fs::symlink(&outside, semester_dir.join("C1")).unwrap();

        assert!(matches!(
            tree.upload("A", "S1", "C1", Category::Exams, "a.pdf", b"x"),
            Err(CatalogError::PathTraversal(_))
        ));
        assert!(matches!(
            tree.list_files("A", "S1", "C1", Category::Exams),
            Err(CatalogError::PathTraversal(_))
        ));
        assert!(!outside.join("exams/a.pdf").exists());
    }

    #[test]
    fn rename_missing_file_is_not_found() {
        let (_dir, tree) = tree();
        assert!(matches!(
            tree.rename("A", "S1", "C1", Category::Exams, "ghost.pdf", "real"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn rename_to_same_name_is_a_no_op() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Exams, "a.pdf", b"x").unwrap();
        let name = tree.rename("A", "S1", "C1", Category::Exams, "a.pdf", "a").unwrap();
        assert_eq!(name, "a.pdf");
    }

    #[test]
    fn delete_reports_missing_files() {
        let (_dir, tree) = tree();
        tree.upload("A", "S1", "C1", Category::Exams, "a.pdf", b"x").unwrap();
        tree.delete("A", "S1", "C1", Category::Exams, "a.pdf").unwrap();
        assert!(matches!(
            tree.delete("A", "S1", "C1", Category::Exams, "a.pdf"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn traversal_filenames_are_rejected() {
        let (_dir, tree) = tree();
        assert!(matches!(
            tree.upload("A", "S1", "C1", Category::Exams, "../escape.pdf", b"x"),
            Err(CatalogError::InvalidName(_))
        ));
        assert!(matches!(
            tree.upload("..", "..", "C1", Category::Exams, "x.pdf", b"x"),
            Err(CatalogError::PathTraversal(_))
        ));
    }

    #[test]
    fn course_folder_deletion_is_idempotent() {
        let (_dir, tree) = tree();
        let course_dir = tree.create_course_folders("A", "S1", "C1").unwrap();
        for category in Category::ALL {
            assert!(course_dir.join(category.dir_name()).is_dir());
        }

        tree.delete_course_folder("A", "S1", "C1").unwrap();
        assert!(!course_dir.exists());
        tree.delete_course_folder("A", "S1", "C1").unwrap();
    }

    #[test]
    fn prune_only_removes_empty_folders() {
        let (_dir, tree) = tree();
        tree.create_course_folders("A", "S1", "C1").unwrap();
        tree.create_course_folders("A", "S2", "C2").unwrap();

        tree.delete_course_folder("A", "S1", "C1").unwrap();
        assert!(tree.prune_empty("A", Some("S1")).unwrap());
        assert!(!tree.prune_empty("A", None).unwrap());
        assert!(!tree.prune_empty("Z", None).unwrap());
    }
}
