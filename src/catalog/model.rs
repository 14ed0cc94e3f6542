//! Catalog model
//!
//! The three-level university → semester → course hierarchy held in memory,
//! and its mapping onto the persisted JSON document.

use log::warn;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CatalogError;
use crate::storage::paths::KEY_SEPARATOR;

const SAMPLE_UNIVERSITY: &str = "Example University";
const SAMPLE_SEMESTER: &str = "Semester 1";
const SAMPLE_COURSE: &str = "Introduction to Computer Science";

/// Identifies the course list of one semester of one university.
///
/// Only flattened to `"{university}_{semester}"` when the catalog is written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseKey {
    pub university: String,
    pub semester: String,
}

impl CourseKey {
    pub fn new(university: &str, semester: &str) -> Self {
        Self {
            university: university.to_string(),
            semester: semester.to_string(),
        }
    }

    /// Key as stored in the settings document
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.university, KEY_SEPARATOR, self.semester)
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.university, self.semester)
    }
}

/// On-disk shape of the catalog
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    universities: Vec<String>,
    #[serde(default)]
    semesters: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    courses: BTreeMap<String, Vec<String>>,
}

/// The catalog hierarchy.
///
/// Sibling names are unique, and every semester list and course list belongs
/// to a university and semester that exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CatalogDocument")]
pub struct Catalog {
    universities: Vec<String>,
    semesters: BTreeMap<String, Vec<String>>,
    courses: BTreeMap<CourseKey, Vec<String>>,
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !name.trim().is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

impl TryFrom<CatalogDocument> for Catalog {
    type Error = String;

    /// Repairs documents that break the catalog invariants: duplicates are
    /// dropped and lists whose parent no longer exists are discarded.
    ///
    /// A course key that more than one (university, semester) pair encodes
    /// to cannot be attributed and fails the load.
    fn try_from(doc: CatalogDocument) -> Result<Self, Self::Error> {
        let universities = dedup(doc.universities);

        let mut semesters = BTreeMap::new();
        for (university, names) in doc.semesters {
            if universities.contains(&university) {
                semesters.insert(university, dedup(names));
            } else {
                warn!("Dropping semesters of unknown university {:?}", university);
            }
        }

        let mut courses = BTreeMap::new();
        for (encoded, names) in doc.courses {
            let mut matches = Vec::new();
            for (university, list) in &semesters {
                for semester in list {
                    let key = CourseKey::new(university, semester);
                    if key.encode() == encoded {
                        matches.push(key);
                    }
                }
            }
            let mut matches = matches.into_iter();
            match (matches.next(), matches.next()) {
                (Some(key), None) => {
                    courses.insert(key, dedup(names));
                }
                (Some(first), Some(second)) => {
                    return Err(format!(
                        "course key {:?} is ambiguous between ({}) and ({})",
                        encoded, first, second
                    ));
                }
                (None, _) => warn!("Dropping orphaned course list {:?}", encoded),
            }
        }

        Ok(Self {
            universities,
            semesters,
            courses,
        })
    }
}

impl Catalog {
    /// Flatten into the on-disk shape, refusing to merge two course lists
    /// whose keys encode to the same string.
    fn to_document(&self) -> Result<CatalogDocument, String> {
        let mut courses = BTreeMap::new();
        for (key, names) in &self.courses {
            if courses.insert(key.encode(), names.clone()).is_some() {
                return Err(format!(
                    "course key {:?} of ({}) collides with another semester",
                    key.encode(),
                    key
                ));
            }
        }
        Ok(CatalogDocument {
            universities: self.universities.clone(),
            semesters: self.semesters.clone(),
            courses,
        })
    }

    /// Another known (university, semester) pair whose course key encodes
    /// like `key`.
    fn key_conflict(&self, key: &CourseKey) -> Option<CourseKey> {
        let encoded = key.encode();
        for (university, list) in &self.semesters {
            for semester in list {
                let other = CourseKey::new(university, semester);
                if &other != key && other.encode() == encoded {
                    return Some(other);
                }
            }
        }
        None
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl Catalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample catalog written on first run
    pub fn bootstrap() -> Self {
        let mut catalog = Self::new();
        catalog.universities.push(SAMPLE_UNIVERSITY.to_string());
        catalog.semesters.insert(
            SAMPLE_UNIVERSITY.to_string(),
            vec![SAMPLE_SEMESTER.to_string()],
        );
        catalog.courses.insert(
            CourseKey::new(SAMPLE_UNIVERSITY, SAMPLE_SEMESTER),
            vec![SAMPLE_COURSE.to_string()],
        );
        catalog
    }

    // --------------------
    // Read accessors
    // --------------------

    pub fn universities(&self) -> &[String] {
        &self.universities
    }

    /// Semesters of a university; empty when the university is unknown.
    pub fn semesters(&self, university: &str) -> &[String] {
        self.semesters
            .get(university)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Courses of a semester; empty when the semester is unknown.
    pub fn courses(&self, university: &str, semester: &str) -> &[String] {
        self.courses
            .get(&CourseKey::new(university, semester))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn semester_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.semesters
    }

    pub fn course_map(&self) -> &BTreeMap<CourseKey, Vec<String>> {
        &self.courses
    }

    pub fn has_university(&self, university: &str) -> bool {
        self.universities.iter().any(|u| u == university)
    }

    pub fn has_semester(&self, university: &str, semester: &str) -> bool {
        self.semesters(university).iter().any(|s| s == semester)
    }

    pub fn has_course(&self, university: &str, semester: &str, course: &str) -> bool {
        self.courses(university, semester).iter().any(|c| c == course)
    }

    fn require_university(&self, university: &str) -> Result<(), CatalogError> {
        if self.has_university(university) {
            Ok(())
        } else {
            Err(CatalogError::NotFound(university.to_string()))
        }
    }

    fn require_semester(&self, university: &str, semester: &str) -> Result<(), CatalogError> {
        self.require_university(university)?;
        if self.has_semester(university, semester) {
            Ok(())
        } else {
            Err(CatalogError::NotFound(format!("{}, {}", university, semester)))
        }
    }

    // --------------------
    // Mutations
    // --------------------

    pub fn add_university(&mut self, name: &str) -> Result<(), CatalogError> {
        if self.has_university(name) {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        self.universities.push(name.to_string());
        self.semesters.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Remove a university with everything below it.
    ///
    /// Returns each removed semester with the courses it held.
    pub fn remove_university(
        &mut self,
        name: &str,
    ) -> Result<Vec<(String, Vec<String>)>, CatalogError> {
        self.require_university(name)?;

        let removed: Vec<(String, Vec<String>)> = self
            .semesters(name)
            .iter()
            .map(|semester| (semester.clone(), self.courses(name, semester).to_vec()))
            .collect();

        self.courses.retain(|key, _| key.university != name);
        self.semesters.remove(name);
        self.universities.retain(|u| u != name);
        Ok(removed)
    }

    pub fn add_semester(&mut self, university: &str, name: &str) -> Result<(), CatalogError> {
        self.require_university(university)?;
        if self.has_semester(university, name) {
            return Err(CatalogError::DuplicateName(format!(
                "{} in {}",
                name, university
            )));
        }
        let key = CourseKey::new(university, name);
        if let Some(other) = self.key_conflict(&key) {
            return Err(CatalogError::DuplicateName(format!(
                "course key {} of ({}) is taken by ({})",
                key.encode(),
                key,
                other
            )));
        }
        self.semesters
            .entry(university.to_string())
            .or_default()
            .push(name.to_string());
        Ok(())
    }

    /// Remove a semester and its course list, returning the removed courses.
    pub fn remove_semester(
        &mut self,
        university: &str,
        name: &str,
    ) -> Result<Vec<String>, CatalogError> {
        self.require_semester(university, name)?;

        let removed = self
            .courses
            .remove(&CourseKey::new(university, name))
            .unwrap_or_default();
        if let Some(list) = self.semesters.get_mut(university) {
            list.retain(|s| s != name);
        }
        Ok(removed)
    }

    pub fn add_course(
        &mut self,
        university: &str,
        semester: &str,
        name: &str,
    ) -> Result<(), CatalogError> {
        self.require_semester(university, semester)?;
        if self.has_course(university, semester, name) {
            return Err(CatalogError::DuplicateName(format!(
                "{} in {}, {}",
                name, university, semester
            )));
        }
        let key = CourseKey::new(university, semester);
        if let Some(other) = self.key_conflict(&key) {
            return Err(CatalogError::DuplicateName(format!(
                "course key {} of ({}) is shared with ({})",
                key.encode(),
                key,
                other
            )));
        }
        self.courses
            .entry(CourseKey::new(university, semester))
            .or_default()
            .push(name.to_string());
        Ok(())
    }

    pub fn remove_course(
        &mut self,
        university: &str,
        semester: &str,
        name: &str,
    ) -> Result<(), CatalogError> {
        self.require_semester(university, semester)?;
        let list = self
            .courses
            .get_mut(&CourseKey::new(university, semester))
            .filter(|list| list.iter().any(|c| c == name))
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        list.retain(|c| c != name);
        Ok(())
    }
}
