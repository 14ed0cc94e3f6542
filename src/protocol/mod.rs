//! Command protocol
//!
//! Handles command parsing, dispatch to the catalog service, and response
//! generation for the line-based front end.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, Folder, parse_command};
pub use handlers::handle_command;
