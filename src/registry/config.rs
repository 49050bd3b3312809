//! Registry configuration

use std::time::Duration;

/// What to do when a create request hits a key that already has an active session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Stop and evict the old session, then create the new one (default)
    ///
    /// Clients normally stop before re-push/pull but do not guarantee it.
    Replace,
    /// Fail the create request with a key conflict
    Reject,
}

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a session may sit in a pending state before eviction
    pub pending_ttl: Duration,

    /// How often the cleanup task scans for expired sessions
    pub cleanup_interval: Duration,

    /// Behavior on key conflict during create
    pub conflict_policy: ConflictPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(5),
            conflict_policy: ConflictPolicy::Replace,
        }
    }
}

impl RegistryConfig {
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
}
