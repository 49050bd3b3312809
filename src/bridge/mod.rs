//! Media bridge seam
//!
//! The media bridge is the external component (SFU / forwarding backend)
//! that carries media once negotiation completes. Signaling only hands it
//! finalized session descriptions; everything past that point is out of
//! scope. The trait is object-safe so deployments can swap backends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::registry::{SessionKey, SessionSnapshot};

/// Error type for bridge operations
#[derive(Debug, Clone)]
pub enum BridgeError {
    /// The bridge backend is unreachable or overloaded
    Unavailable(String),
    /// The bridge refused the session
    Rejected(String),
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Unavailable(msg) => write!(f, "Bridge unavailable: {}", msg),
            BridgeError::Rejected(msg) => write!(f, "Bridge rejected session: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Interface to the media-forwarding backend
///
/// `attach` is invoked at most once per successfully negotiated session,
/// `detach` at most once per attached session. Implementations may be slow
/// or fail independently of signaling state; a failed attach never reverts
/// a session's negotiated state.
#[async_trait]
pub trait MediaBridge: Send + Sync {
    /// Hand a finalized session to the media plane
    async fn attach(&self, session: &SessionSnapshot) -> Result<(), BridgeError>;

    /// Release the media plane resources for a session
    async fn detach(&self, key: &SessionKey) -> Result<(), BridgeError>;
}

/// Bridge that records invocations and forwards nothing
///
/// Default for the demo server; also serves as the test double.
#[derive(Debug, Default)]
pub struct NullBridge {
    attached: Mutex<Vec<SessionKey>>,
    detached: Mutex<Vec<SessionKey>>,
    fail_attach: AtomicBool,
}

impl NullBridge {
    /// Create a new recording bridge
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent attach calls fail
    pub fn set_fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::Relaxed);
    }

    /// Keys attached so far, in order
    pub fn attached(&self) -> Vec<SessionKey> {
        self.attached.lock().unwrap().clone()
    }

    /// Keys detached so far, in order
    pub fn detached(&self) -> Vec<SessionKey> {
        self.detached.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaBridge for NullBridge {
    async fn attach(&self, session: &SessionSnapshot) -> Result<(), BridgeError> {
        if self.fail_attach.load(Ordering::Relaxed) {
            return Err(BridgeError::Unavailable("attach disabled".into()));
        }

        self.attached.lock().unwrap().push(session.key.clone());
        tracing::debug!(session = %session.key, "Bridge attach");
        Ok(())
    }

    async fn detach(&self, key: &SessionKey) -> Result<(), BridgeError> {
        self.detached.lock().unwrap().push(key.clone());
        tracing::debug!(session = %key, "Bridge detach");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Role;

    #[tokio::test]
    async fn test_null_bridge_records_invocations() {
        let bridge = NullBridge::new();
        let key = SessionKey::new("u1", "s1", Role::Publisher);
        let snapshot = SessionSnapshot {
            key: key.clone(),
            want_audio: true,
            want_video: true,
            local_sdp: None,
            remote_sdp: None,
        };

        bridge.attach(&snapshot).await.unwrap();
        bridge.detach(&key).await.unwrap();

        assert_eq!(bridge.attached(), vec![key.clone()]);
        assert_eq!(bridge.detached(), vec![key]);
    }

    #[tokio::test]
    async fn test_null_bridge_attach_failure() {
        let bridge = NullBridge::new();
        bridge.set_fail_attach(true);

        let snapshot = SessionSnapshot {
            key: SessionKey::new("u1", "s1", Role::Publisher),
            want_audio: true,
            want_video: false,
            local_sdp: None,
            remote_sdp: None,
        };

        let result = bridge.attach(&snapshot).await;
        assert!(matches!(result, Err(BridgeError::Unavailable(_))));
        assert!(bridge.attached().is_empty());
    }
}
