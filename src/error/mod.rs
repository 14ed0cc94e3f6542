//! Error handling
//!
//! Defines error types and handling for the portal.

pub mod handlers;
pub mod types;

pub use types::*;
