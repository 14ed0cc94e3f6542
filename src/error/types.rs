//! Error types
//!
//! Defines domain-specific error types for the catalog, resource tree and
//! authentication boundary of the portal.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Catalog and resource errors
///
/// Every variant is recoverable: callers render it as a message and keep going.
#[derive(Debug)]
pub enum CatalogError {
    /// A sibling with the same name already exists in the catalog
    DuplicateName(String),
    /// A university, semester, course or file does not exist
    NotFound(String),
    /// A rename target already exists in the folder
    AlreadyExists(String),
    /// The settings document could not be parsed
    CorruptStore(String),
    /// The settings document could not be written
    StoreError(io::Error),
    /// A resource file could not be written
    WriteError(io::Error),
    InvalidName(String),
    PathTraversal(PathBuf),
    FileTooLarge { size: u64, limit: u64 },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateName(n) => write!(f, "{} already exists", n),
            CatalogError::NotFound(n) => write!(f, "Not found: {}", n),
            CatalogError::AlreadyExists(n) => write!(f, "File already exists: {}", n),
            CatalogError::CorruptStore(e) => write!(f, "Settings document is corrupt: {}", e),
            CatalogError::StoreError(e) => write!(f, "Failed to save settings: {}", e),
            CatalogError::WriteError(e) => write!(f, "Failed to write file: {}", e),
            CatalogError::InvalidName(n) => write!(f, "Invalid name: {:?}", n),
            CatalogError::PathTraversal(p) => {
                write!(f, "Path escapes the uploads root: {}", p.display())
            }
            CatalogError::FileTooLarge { size, limit } => {
                write!(f, "File too large: {} bytes (limit {} bytes)", size, limit)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::StoreError(e) | CatalogError::WriteError(e) => Some(e),
            _ => None,
        }
    }
}

/// Plain I/O failures outside the settings document are resource writes.
impl From<io::Error> for CatalogError {
    fn from(error: io::Error) -> Self {
        CatalogError::WriteError(error)
    }
}

/// Authentication boundary errors
#[derive(Debug, PartialEq)]
pub enum AuthError {
    InvalidCredentials(String),
    AdminDisabled,
    MalformedInput(String),
    NotAuthorized,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials(u) => write!(f, "Incorrect username or password for {}", u),
            AuthError::AdminDisabled => write!(f, "Admin login is disabled"),
            AuthError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
            AuthError::NotAuthorized => write!(f, "Admin login required"),
        }
    }
}

impl std::error::Error for AuthError {}

/// General portal error that encompasses all error types
#[derive(Debug)]
pub enum PortalError {
    Catalog(CatalogError),
    Auth(AuthError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::Catalog(e) => write!(f, "Catalog error: {}", e),
            PortalError::Auth(e) => write!(f, "Authentication error: {}", e),
            PortalError::Config(e) => write!(f, "Configuration error: {}", e),
            PortalError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PortalError {}

impl From<CatalogError> for PortalError {
    fn from(error: CatalogError) -> Self {
        PortalError::Catalog(error)
    }
}

impl From<AuthError> for PortalError {
    fn from(error: AuthError) -> Self {
        PortalError::Auth(error)
    }
}

impl From<config::ConfigError> for PortalError {
    fn from(error: config::ConfigError) -> Self {
        PortalError::Config(error)
    }
}

impl From<io::Error> for PortalError {
    fn from(error: io::Error) -> Self {
        PortalError::IoError(error)
    }
}
