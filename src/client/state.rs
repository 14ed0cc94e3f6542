//! Module `state`
//!
//! Defines the `Session` struct tracking what one connected client may do.

use std::net::SocketAddr;

/// Represents the state of a connected client.
///
/// Anonymous sessions may browse and download; admin sessions may also
/// change the catalog and its files.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: Option<String>,
    client_addr: Option<SocketAddr>,
    is_admin: bool,
}

impl Session {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr: Some(client_addr),
            ..Self::default()
        }
    }

    /// Marks the session as an authorized administrator.
    pub fn login(&mut self, username: &str) {
        self.username = Some(username.to_string());
        self.is_admin = true;
    }

    /// Drops admin rights, keeping the connection.
    pub fn logout(&mut self) {
        self.username = None;
        self.is_admin = false;
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Label for log lines
    pub fn peer(&self) -> String {
        self.client_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "local".to_string())
    }
}
