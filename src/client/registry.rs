//! Client registry
//!
//! Tracks connected clients so the server can enforce its connection limit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// Registry for tracking active connections
#[derive(Debug)]
pub struct ClientRegistry {
    clients: HashMap<SocketAddr, Instant>,
    max_clients: usize,
}

impl ClientRegistry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Register a client; refused once the limit is reached.
    pub fn try_register(&mut self, addr: SocketAddr) -> bool {
        if self.clients.len() >= self.max_clients && !self.clients.contains_key(&addr) {
            return false;
        }
        self.clients.insert(addr, Instant::now());
        true
    }

    /// Remove a client, returning when it connected.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Instant> {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_limit() {
        let mut registry = ClientRegistry::new(1);
        let a: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:5001".parse().unwrap();

        assert!(registry.try_register(a));
        assert!(!registry.try_register(b));
        assert!(registry.remove(&a).is_some());
        assert!(registry.try_register(b));
        assert_eq!(registry.len(), 1);
    }
}
