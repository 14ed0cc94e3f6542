//! Server core functionality
//!
//! Accepts connections and hands each one to a client session.

pub mod core;

pub use self::core::Server;
