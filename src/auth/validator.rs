//! Authentication validator
//!
//! Decides whether a login may act as the portal administrator. Credentials
//! come from configuration; none are compiled in.

use crate::config::PortalConfig;
use crate::error::AuthError;

const MAX_CREDENTIAL_LENGTH: usize = 128;

/// Gatekeeper consulted by the front end before any catalog mutation.
pub trait Authenticator: Send + Sync {
    fn authorize(&self, username: &str, password: &str) -> Result<(), AuthError>;
}

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Compare without returning early on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The single administrator account from [`PortalConfig`]
#[derive(Clone)]
pub struct ConfiguredAdmin {
    username: String,
    password: Option<String>,
}

impl ConfiguredAdmin {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.admin_username.clone(), config.admin_password.clone())
    }
}

impl std::fmt::Debug for ConfiguredAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredAdmin")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Authenticator for ConfiguredAdmin {
    fn authorize(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let Some(expected) = &self.password else {
            return Err(AuthError::AdminDisabled);
        };

        if !is_valid_input(username, MAX_CREDENTIAL_LENGTH) {
            return Err(AuthError::MalformedInput("Invalid username format".into()));
        }
        if !is_valid_input(password, MAX_CREDENTIAL_LENGTH) {
            return Err(AuthError::MalformedInput("Invalid password format".into()));
        }

        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), expected.as_bytes());
        if user_ok && pass_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials(username.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_configured_credentials_only() {
        let admin = ConfiguredAdmin::new("admin", Some("s3cret".into()));
        assert_eq!(admin.authorize("admin", "s3cret"), Ok(()));
        assert_eq!(
            admin.authorize("admin", "wrong"),
            Err(AuthError::InvalidCredentials("admin".into()))
        );
        assert!(admin.authorize("root", "s3cret").is_err());
    }

    #[test]
    fn missing_password_disables_login() {
        let admin = ConfiguredAdmin::new("admin", None);
        assert_eq!(admin.authorize("admin", ""), Err(AuthError::AdminDisabled));
    }

    #[test]
    fn rejects_malformed_input() {
        let admin = ConfiguredAdmin::new("admin", Some("pw".into()));
        assert!(matches!(
            admin.authorize("ad\nmin", "pw"),
            Err(AuthError::MalformedInput(_))
        ));
        assert!(matches!(
            admin.authorize("admin", " "),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn debug_output_hides_password() {
        let admin = ConfiguredAdmin::new("admin", Some("s3cret".into()));
        assert!(!format!("{:?}", admin).contains("s3cret"));
    }
}
