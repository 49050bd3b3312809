//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::registry::{ConflictPolicy, RegistryConfig};

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// How long a session may sit mid-negotiation before eviction
    pub pending_ttl: Duration,

    /// How often the registry scans for expired sessions
    pub cleanup_interval: Duration,

    /// What to do when a create request hits an active session key
    pub conflict_policy: ConflictPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            pending_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(5),
            conflict_policy: ConflictPolicy::Replace,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the pending-session TTL
    pub fn pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Set the cleanup scan interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Set the conflict policy
    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Registry configuration derived from this server config
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .pending_ttl(self.pending_ttl)
            .cleanup_interval(self.cleanup_interval)
            .conflict_policy(self.conflict_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.pending_ttl, Duration::from_secs(30));
        assert_eq!(config.conflict_policy, ConflictPolicy::Replace);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .pending_ttl(Duration::from_secs(5))
            .cleanup_interval(Duration::from_secs(1))
            .conflict_policy(ConflictPolicy::Reject);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.pending_ttl, Duration::from_secs(5));
        assert_eq!(config.cleanup_interval, Duration::from_secs(1));
        assert_eq!(config.conflict_policy, ConflictPolicy::Reject);

        let registry_config = config.registry_config();
        assert_eq!(registry_config.pending_ttl, Duration::from_secs(5));
        assert_eq!(registry_config.conflict_policy, ConflictPolicy::Reject);
    }
}
