//! Error handlers
//!
//! Maps errors onto the numeric response codes of the command front end.

use crate::error::types::{AuthError, CatalogError, PortalError};
use log::error;

/// Log a portal error
pub fn handle_error(err: &PortalError) {
    error!("Portal error: {}", err);
}

/// Convert a catalog error to a response code
pub fn error_code(err: &CatalogError) -> u16 {
    match err {
        CatalogError::DuplicateName(_) => 553,
        CatalogError::NotFound(_) => 550,
        CatalogError::AlreadyExists(_) => 553,
        CatalogError::CorruptStore(_) => 451,
        CatalogError::StoreError(_) => 451,
        CatalogError::WriteError(_) => 452,
        CatalogError::InvalidName(_) => 501,
        CatalogError::PathTraversal(_) => 553,
        CatalogError::FileTooLarge { .. } => 552,
    }
}

/// Convert an authentication error to a response code
pub fn auth_error_code(err: &AuthError) -> u16 {
    match err {
        AuthError::MalformedInput(_) => 501,
        AuthError::InvalidCredentials(_) | AuthError::AdminDisabled | AuthError::NotAuthorized => {
            530
        }
    }
}
