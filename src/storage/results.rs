//! Storage result types
//!
//! Defines the categories of course resources and the structures returned by
//! resource tree operations.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

/// One of the three fixed resource subfolders of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Exams,
    Sheets,
    Tips,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Exams, Category::Sheets, Category::Tips];

    /// Folder name on disk
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Exams => "exams",
            Category::Sheets => "sheets",
            Category::Tips => "tips",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exams" | "exam" => Ok(Category::Exams),
            "sheets" | "sheet" | "study sheets" => Ok(Category::Sheets),
            "tips" | "tip" | "notes" => Ok(Category::Tips),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Display hint derived from the file extension; no content is inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Document,
    Archive,
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" => FileKind::Image,
            "doc" | "docx" | "odt" | "txt" | "md" | "rtf" | "ppt" | "pptx" | "xls" | "xlsx" => {
                FileKind::Document
            }
            "zip" | "tar" | "gz" | "7z" | "rar" => FileKind::Archive,
            _ => FileKind::Other,
        }
    }
}

/// Metadata of one uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFile {
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl ResourceFile {
    /// Upload date as `YYYY-MM-DD` in local time
    pub fn uploaded_on(&self) -> String {
        DateTime::<Local>::from(self.modified)
            .format("%Y-%m-%d")
            .to_string()
    }

    pub fn size_kb(&self) -> f64 {
        self.size as f64 / 1024.0
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_name(&self.name)
    }
}

/// A file's metadata together with its bytes, for download or preview
#[derive(Debug, Clone)]
pub struct ResourceContent {
    pub file: ResourceFile,
    pub bytes: Vec<u8>,
}
