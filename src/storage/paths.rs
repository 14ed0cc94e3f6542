//! Path resolution and validation
//!
//! Maps catalog entries onto course folders under the uploads root and
//! checks that every path handed to the filesystem stays under that root.

use std::path::{Component, Path, PathBuf};

use crate::error::CatalogError;

/// Separator used in the persisted `"{university}_{semester}"` course keys.
pub const KEY_SEPARATOR: char = '_';

/// Replace spaces with underscores and slashes with hyphens.
pub fn sanitize_component(name: &str) -> String {
    name.replace(' ', "_").replace('/', "-")
}

/// Resolve the course folder for a (university, semester, course) triple.
///
/// Pure and total: nothing is checked here, see [`ensure_within`].
pub fn resolve(root: &Path, university: &str, semester: &str, course: &str) -> PathBuf {
    root.join(sanitize_component(university))
        .join(sanitize_component(semester))
        .join(sanitize_component(course))
}

/// Resolve a course folder and verify it stays under `root`.
pub fn resolve_checked(
    root: &Path,
    university: &str,
    semester: &str,
    course: &str,
) -> Result<PathBuf, CatalogError> {
    resolve_within(root, &[university, semester, course])
}

/// Sanitize and join `names` under `root`, verifying the result stays there.
///
/// A name such as `.` or `..` survives sanitization, so each segment is
/// checked before joining; `Path::join` would otherwise fold `.` away.
pub fn resolve_within(root: &Path, names: &[&str]) -> Result<PathBuf, CatalogError> {
    let mut path = root.to_path_buf();
    for name in names {
        let segment = sanitize_component(name);
        if !is_single_component(&segment) {
            return Err(CatalogError::PathTraversal(root.join(segment)));
        }
        path.push(segment);
    }
    ensure_within(root, &path)?;
    Ok(path)
}

/// True when `component` is exactly one ordinary path segment.
fn is_single_component(component: &str) -> bool {
    if component.is_empty() || component.contains(['\0', '\\', '/']) {
        return false;
    }
    let mut components = Path::new(component).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == component
    )
}

/// Validate a catalog name: trimmed, non-empty, no control characters, and
/// usable as a folder name once sanitized.
pub fn validate_name(name: &str) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.chars().any(char::is_control)
        || !is_single_component(&sanitize_component(trimmed))
    {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

/// University names additionally may not contain the course key separator.
pub fn validate_university_name(name: &str) -> Result<String, CatalogError> {
    let name = validate_name(name)?;
    if name.contains(KEY_SEPARATOR) {
        return Err(CatalogError::InvalidName(name));
    }
    Ok(name)
}

/// Validate a resource filename: a single path component, no control characters.
pub fn validate_filename(filename: &str) -> Result<&str, CatalogError> {
    if !is_single_component(filename) || filename.chars().any(char::is_control) {
        return Err(CatalogError::InvalidName(filename.to_string()));
    }
    Ok(filename)
}

/// Check that `path` cannot escape `root`.
///
/// Every segment below the root must be an ordinary component. When the path
/// (or its nearest existing ancestor) is on disk, its canonical form must
/// still start with the canonical root, which catches symlinked folders.
pub fn ensure_within(root: &Path, path: &Path) -> Result<(), CatalogError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| CatalogError::PathTraversal(path.to_path_buf()))?;

    for component in relative.components() {
        match component {
            Component::Normal(c) if c.to_str().is_some_and(is_single_component) => {}
            _ => return Err(CatalogError::PathTraversal(path.to_path_buf())),
        }
    }

    let Ok(canonical_root) = root.canonicalize() else {
        // Nothing exists yet, so nothing can be a symlink out of the root.
        return Ok(());
    };

    let existing = path.ancestors().find(|p| p.exists()).unwrap_or(root);
    match existing.canonicalize() {
        Ok(canonical) if canonical.starts_with(&canonical_root) => Ok(()),
        _ => Err(CatalogError::PathTraversal(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_replaces_spaces_and_slashes() {
        let path = resolve(
            Path::new("data/uploads"),
            "Example University",
            "Fall/Winter",
            "Calculus I",
        );
        assert_eq!(
            path,
            PathBuf::from("data/uploads/Example_University/Fall-Winter/Calculus_I")
        );
    }

    #[test]
    fn resolve_is_deterministic() {
        let root = Path::new("data/uploads");
        assert_eq!(resolve(root, "A", "S1", "C1"), resolve(root, "A", "S1", "C1"));
        assert_eq!(resolve(root, "A", "S1", "C1"), PathBuf::from("data/uploads/A/S1/C1"));
    }

    #[test]
    fn distinct_names_may_collide() {
        let root = Path::new("r");
        assert_eq!(resolve(root, "A B", "S", "C"), resolve(root, "A_B", "S", "C"));
    }

    #[test]
    fn dot_segments_are_rejected() {
        let root = Path::new("data/uploads");
        let escaped = resolve(root, "..", "..", "etc");
        assert!(matches!(
            ensure_within(root, &escaped),
            Err(CatalogError::PathTraversal(_))
        ));
        assert!(ensure_within(root, &resolve(root, "A", "S1", "C1")).is_ok());
    }

    #[test]
    fn resolve_checked_rejects_current_dir_names() {
        let root = Path::new("data/uploads");
        assert!(resolve_checked(root, ".", "S1", "C1").is_err());
        assert!(resolve_checked(root, "A", "..", "C1").is_err());
        assert_eq!(
            resolve_checked(root, "A", "S1", "C1").unwrap(),
            PathBuf::from("data/uploads/A/S1/C1")
        );
    }

    #[test]
    fn ancestors_resolve_under_root() {
        let root = Path::new("data/uploads");
        assert_eq!(
            resolve_within(root, &["Example University"]).unwrap(),
            PathBuf::from("data/uploads/Example_University")
        );
        assert!(resolve_within(root, &["A", "."]).is_err());
    }

    #[test]
    fn ensure_within_rejects_foreign_paths() {
        let root = Path::new("data/uploads");
        assert!(ensure_within(root, Path::new("/tmp/other")).is_err());
    }

    #[test]
    fn filenames_must_be_one_component() {
        assert!(validate_filename("midterm.pdf").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename(".").is_err());
        assert!(validate_filename("a/b.pdf").is_err());
        assert!(validate_filename("a\\b.pdf").is_err());
    }

    #[test]
    fn university_names_reject_separator() {
        assert_eq!(validate_university_name("  A  ").unwrap(), "A");
        assert!(validate_university_name("My_Uni").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("Semester_1").is_ok());
        assert!(validate_name("..").is_err());
        assert!(validate_name("Fall/Winter").is_ok());
    }
}
