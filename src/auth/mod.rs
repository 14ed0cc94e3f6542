//! Authentication system
//!
//! The boundary that authorizes administrator sessions. The catalog core
//! never checks credentials itself.

pub mod validator;

pub use validator::{Authenticator, ConfiguredAdmin};
