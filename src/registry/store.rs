//! Session registry implementation
//!
//! The central registry that maps `(uid, stream name, role)` keys to live
//! sessions and enforces key uniqueness and lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::config::{ConflictPolicy, RegistryConfig};
use super::error::RegistryError;
use super::key::{Role, SessionKey};
use super::session::{Initiator, Session, SessionState};

/// Central registry for all active sessions
///
/// Thread-safe via `RwLock`. Mutating operations on the same key serialize
/// on the map-wide write lock; per-session mutation happens under each
/// session's own lock. Lock order is always map first, session second.
pub struct SessionRegistry {
    /// Map of session key to session
    sessions: RwLock<HashMap<SessionKey, Arc<RwLock<Session>>>>,

    /// Configuration
    config: RegistryConfig,
}

impl SessionRegistry {
    /// Create a new session registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new session registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a session under the given key
    ///
    /// If a non-stopped session already holds the key, the configured
    /// conflict policy decides: `Replace` evicts it atomically under the map
    /// lock and stops it, `Reject` fails with `KeyConflict`. Returns the new
    /// session and the replaced one (if any) so the caller can release its
    /// media resources.
    pub async fn create(
        &self,
        key: SessionKey,
        initiator: Initiator,
        want_audio: bool,
        want_video: bool,
    ) -> Result<(Arc<RwLock<Session>>, Option<Arc<RwLock<Session>>>), RegistryError> {
        let mut sessions = self.sessions.write().await;

        let mut replaced = None;
        if let Some(existing) = sessions.remove(&key) {
            // A held session lock means someone is mid-operation on it;
            // treat it as live rather than waiting under the map lock
            let active = match existing.try_read() {
                Ok(session) => session.state() != SessionState::Stopped,
                Err(_) => true,
            };

            if active {
                match self.config.conflict_policy {
                    ConflictPolicy::Reject => {
                        sessions.insert(key.clone(), existing);
                        return Err(RegistryError::KeyConflict(key));
                    }
                    ConflictPolicy::Replace => {
                        tracing::info!(
                            session = %key,
                            "Replacing active session"
                        );
                        replaced = Some(existing);
                    }
                }
            }
        }

        let session = Arc::new(RwLock::new(Session::new(
            key.clone(),
            initiator,
            want_audio,
            want_video,
        )));
        sessions.insert(key.clone(), Arc::clone(&session));
        drop(sessions);

        // Stop the evicted session off the map lock so operations on other
        // keys never queue behind its session lock
        if let Some(old) = replaced.as_ref() {
            let _ = old.write().await.advance(SessionState::Stopped);
        }

        tracing::info!(
            session = %key,
            initiator = ?initiator,
            audio = want_audio,
            video = want_video,
            "Session created"
        );

        Ok((session, replaced))
    }

    /// Find the session under the given key
    pub async fn find(&self, key: &SessionKey) -> Result<Arc<RwLock<Session>>, RegistryError> {
        let sessions = self.sessions.read().await;

        sessions
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::SessionNotFound(key.clone()))
    }

    /// Remove the session under the given key
    ///
    /// Idempotent: a no-op when the key is absent. The removed session is
    /// transitioned to `Stopped` and returned so the caller can release its
    /// media resources.
    pub async fn remove(&self, key: &SessionKey) -> Option<Arc<RwLock<Session>>> {
        let mut sessions = self.sessions.write().await;

        let entry = sessions.remove(key)?;
        {
            let mut session = entry.write().await;
            let _ = session.advance(SessionState::Stopped);
        }

        tracing::info!(session = %key, "Session removed");
        Some(entry)
    }

    /// Check whether a stream has a non-stopped publisher session
    pub async fn has_active_publisher(&self, stream_name: &str) -> bool {
        let sessions = self.sessions.read().await;

        for (key, entry) in sessions.iter() {
            if key.role == Role::Publisher && key.stream_name == stream_name {
                let session = entry.read().await;
                if session.state() != SessionState::Stopped {
                    return true;
                }
            }
        }

        false
    }

    /// Get total number of registered sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Get the number of negotiated sessions
    pub async fn negotiated_count(&self) -> usize {
        let sessions = self.sessions.read().await;

        let mut count = 0;
        for entry in sessions.values() {
            if entry.read().await.state() == SessionState::Negotiated {
                count += 1;
            }
        }
        count
    }

    /// Run cleanup once
    ///
    /// Evicts sessions stuck in a pending state (`Created`, `OfferSent`,
    /// `AwaitingAnswer`) beyond the configured TTL, transitioning them to
    /// `Stopped`. Pending sessions were never attached to the media bridge,
    /// so eviction releases no bridge resources.
    pub async fn cleanup(&self) {
        let mut sessions = self.sessions.write().await;

        let keys_to_remove: Vec<SessionKey> = sessions
            .iter()
            .filter_map(|(key, entry)| {
                // Skip entries whose lock is held; the next scan catches them
                if let Ok(session) = entry.try_read() {
                    if session.state().is_pending() && session.age() > self.config.pending_ttl {
                        Some(key.clone())
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .collect();

        for key in keys_to_remove {
            if let Some(entry) = sessions.remove(&key) {
                let mut session = entry.write().await;
                let _ = session.advance(SessionState::Stopped);
                tracing::info!(session = %key, "Session evicted by TTL cleanup");
            }
        }
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.cleanup().await;
            }
        })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
