//! Offer/answer negotiation sequencing
//!
//! One coordinator drives the handshake for every session, parameterized by
//! role and by which side originates the offer. Both sequencing modes reach
//! `Negotiated` in at most two request/response round trips:
//!
//! - **Server-initiates** (legacy clients): create synthesizes an offer and
//!   returns it; the client replies through sendanswer.
//! - **Client-initiates** (current clients): the create request carries the
//!   client's offer; the answer is synthesized and returned synchronously.
//!
//! The coordinator never waits for a client message; abandoned sessions are
//! evicted by the registry's TTL cleanup.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::bridge::MediaBridge;
use crate::error::{Result, SignalingError};
use crate::registry::{
    Initiator, Role, Session, SessionKey, SessionRegistry, SessionSnapshot, SessionState,
};

use super::sdp;

/// Whether a returned SDP blob is an offer or an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

impl SdpKind {
    /// Wire name for the `data.type` response field
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpKind::Offer => "offer",
            SdpKind::Answer => "answer",
        }
    }
}

/// SDP blob returned from a create operation
#[derive(Debug, Clone)]
pub struct SdpPayload {
    pub kind: SdpKind,
    pub sdp: String,
}

/// Executes the offer/answer handshake for publish and subscribe sessions
pub struct NegotiationCoordinator {
    registry: Arc<SessionRegistry>,
    bridge: Arc<dyn MediaBridge>,
}

impl NegotiationCoordinator {
    /// Create a coordinator over the given registry and media bridge
    pub fn new(registry: Arc<SessionRegistry>, bridge: Arc<dyn MediaBridge>) -> Self {
        Self { registry, bridge }
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Create a publish or subscribe session and run the first handshake step
    ///
    /// Without a client offer the server synthesizes one and the session
    /// waits in `OfferSent` for the client's answer. With a client offer the
    /// session negotiates in place and the answer is returned synchronously.
    pub async fn create_session(
        &self,
        key: SessionKey,
        want_audio: bool,
        want_video: bool,
        client_offer: Option<String>,
    ) -> Result<SdpPayload> {
        // A subscriber needs a live publisher to pull from
        if key.role == Role::Subscriber
            && !self.registry.has_active_publisher(&key.stream_name).await
        {
            tracing::warn!(session = %key, "Pull rejected: no active publisher");
            return Err(SignalingError::NotFound(key));
        }

        let initiator = if client_offer.is_some() {
            Initiator::Client
        } else {
            Initiator::Server
        };

        let (session, replaced) = self
            .registry
            .create(key.clone(), initiator, want_audio, want_video)
            .await?;

        if let Some(replaced) = replaced {
            self.release_bridge(&replaced).await;
        }

        let mut guard = session.write().await;
        match client_offer {
            Some(offer) => {
                guard.set_remote_sdp(offer.clone());
                let answer = sdp::answer(&offer, want_audio, want_video);
                guard.set_local_sdp(answer.clone())?;
                guard.advance(SessionState::Negotiated)?;
                let snapshot = guard.mark_attach_invoked().then(|| guard.snapshot());
                drop(guard);

                tracing::info!(session = %key, "Session negotiated (client offer)");
                if let Some(snapshot) = snapshot {
                    self.attach(&snapshot).await?;
                }

                Ok(SdpPayload {
                    kind: SdpKind::Answer,
                    sdp: answer,
                })
            }
            None => {
                let offer = sdp::offer(want_audio, want_video);
                guard.set_local_sdp(offer.clone())?;
                guard.advance(SessionState::OfferSent)?;

                tracing::info!(session = %key, "Offer sent (server initiates)");
                Ok(SdpPayload {
                    kind: SdpKind::Offer,
                    sdp: offer,
                })
            }
        }
    }

    /// Accept the client's SDP answer for a session in `OfferSent`
    ///
    /// A replayed answer against a client-initiated session that already
    /// negotiated is ignored when its payload matches the stored SDP, so
    /// both client generations work against one server. Any other state
    /// mismatch fails with `InvalidState`.
    pub async fn handle_answer(&self, key: &SessionKey, answer: String) -> Result<()> {
        let session = self.registry.find(key).await?;
        let mut guard = session.write().await;

        match guard.state() {
            SessionState::OfferSent => {
                guard.set_remote_sdp(answer);
                guard.advance(SessionState::Negotiated)?;
                let snapshot = guard.mark_attach_invoked().then(|| guard.snapshot());
                drop(guard);

                tracing::info!(session = %key, "Session negotiated (answer received)");
                match snapshot {
                    Some(snapshot) => self.attach(&snapshot).await,
                    None => Ok(()),
                }
            }
            SessionState::Negotiated if guard.initiator == Initiator::Client => {
                let matches = guard.remote_sdp() == Some(answer.as_str())
                    || guard.local_sdp() == Some(answer.as_str());
                if matches {
                    tracing::debug!(session = %key, "Duplicate answer ignored");
                    Ok(())
                } else {
                    Err(SignalingError::InvalidState(format!(
                        "answer conflicts with negotiated session {}",
                        key
                    )))
                }
            }
            state => Err(SignalingError::InvalidState(format!(
                "sendanswer not valid for session {} in state {}",
                key, state
            ))),
        }
    }

    /// Stop a session and release its media resources
    ///
    /// Idempotent: stopping an absent or already-stopped session is a no-op.
    /// The bridge detach runs asynchronously; the session is gone from the
    /// registry by the time this returns.
    pub async fn stop(&self, key: &SessionKey) -> Result<()> {
        let Some(session) = self.registry.remove(key).await else {
            tracing::debug!(session = %key, "Stop for unknown session ignored");
            return Ok(());
        };

        self.release_bridge(&session).await;
        Ok(())
    }

    /// Invoke the bridge attach for a freshly negotiated session
    ///
    /// The caller marks the session attach-invoked under its lock and drops
    /// the lock before calling in, so a slow bridge never holds up other
    /// operations on the session. A failed attach is reported to the caller
    /// but never reverts the session's negotiated state; the session stays
    /// attach-pending and is released normally on stop.
    async fn attach(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Err(e) = self.bridge.attach(snapshot).await {
            tracing::warn!(session = %snapshot.key, error = %e, "Bridge attach failed");
            return Err(SignalingError::Bridge(e.to_string()));
        }

        Ok(())
    }

    /// Schedule the bridge detach for a stopped session, at most once
    async fn release_bridge(&self, session: &Arc<RwLock<Session>>) {
        let mut guard = session.write().await;
        if !guard.attach_invoked() || !guard.mark_detach_invoked() {
            return;
        }

        let key = guard.key.clone();
        drop(guard);

        let bridge = Arc::clone(&self.bridge);
        tokio::spawn(async move {
            if let Err(e) = bridge.detach(&key).await {
                tracing::warn!(session = %key, error = %e, "Bridge detach failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::bridge::{BridgeError, NullBridge};

    fn coordinator() -> (NegotiationCoordinator, Arc<NullBridge>) {
        let registry = Arc::new(SessionRegistry::new());
        let bridge = Arc::new(NullBridge::new());
        (
            NegotiationCoordinator::new(registry, bridge.clone() as Arc<dyn MediaBridge>),
            bridge,
        )
    }

    fn push_key() -> SessionKey {
        SessionKey::new("u1", "s1", Role::Publisher)
    }

    async fn wait_for_detach(bridge: &NullBridge, count: usize) {
        for _ in 0..50 {
            if bridge.detached().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("bridge detach not invoked");
    }

    #[tokio::test]
    async fn test_server_initiates_flow() {
        let (coord, bridge) = coordinator();
        let key = push_key();

        let payload = coord
            .create_session(key.clone(), true, true, None)
            .await
            .unwrap();
        assert_eq!(payload.kind, SdpKind::Offer);
        assert!(payload.sdp.starts_with("v=0"));

        let session = coord.registry().find(&key).await.unwrap();
        assert_eq!(session.read().await.state(), SessionState::OfferSent);
        assert!(bridge.attached().is_empty());

        coord
            .handle_answer(&key, "v=0\r\nm=audio 9 X\r\n".into())
            .await
            .unwrap();
        assert_eq!(session.read().await.state(), SessionState::Negotiated);
        assert_eq!(bridge.attached(), vec![key]);
    }

    #[tokio::test]
    async fn test_answer_for_unknown_key_is_not_found() {
        let (coord, _) = coordinator();

        let err = coord
            .handle_answer(&push_key(), "v=0".into())
            .await
            .unwrap_err();
        assert!(matches!(err, SignalingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_answer_before_offer_is_invalid_state() {
        let (coord, _) = coordinator();
        let key = push_key();

        // Force a session still in Created
        coord
            .registry()
            .create(key.clone(), Initiator::Server, true, true)
            .await
            .unwrap();

        let err = coord.handle_answer(&key, "v=0".into()).await.unwrap_err();
        assert!(matches!(err, SignalingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_client_initiates_flow() {
        let (coord, bridge) = coordinator();
        let key = push_key();
        let offer = sdp::offer(true, true);

        let payload = coord
            .create_session(key.clone(), true, true, Some(offer.clone()))
            .await
            .unwrap();
        assert_eq!(payload.kind, SdpKind::Answer);

        // Negotiated immediately, no sendanswer round trip needed
        let session = coord.registry().find(&key).await.unwrap();
        assert_eq!(session.read().await.state(), SessionState::Negotiated);
        assert_eq!(bridge.attached(), vec![key.clone()]);

        // Defensive replay with the stored payload is ignored
        coord.handle_answer(&key, offer).await.unwrap();
        coord.handle_answer(&key, payload.sdp).await.unwrap();
        assert_eq!(bridge.attached().len(), 1);

        // A conflicting payload is refused
        let err = coord
            .handle_answer(&key, "v=0\r\nm=video 9 Y\r\n".into())
            .await
            .unwrap_err();
        assert!(matches!(err, SignalingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_pull_requires_active_publisher() {
        let (coord, _) = coordinator();
        let pull_key = SessionKey::new("u2", "s1", Role::Subscriber);

        let err = coord
            .create_session(pull_key.clone(), true, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SignalingError::NotFound(_)));

        coord
            .create_session(push_key(), true, true, None)
            .await
            .unwrap();

        let payload = coord
            .create_session(pull_key, true, true, None)
            .await
            .unwrap();
        assert_eq!(payload.kind, SdpKind::Offer);
    }

    #[tokio::test]
    async fn test_stop_detaches_exactly_once() {
        let (coord, bridge) = coordinator();
        let key = push_key();
        let offer = sdp::offer(true, true);

        coord
            .create_session(key.clone(), true, true, Some(offer))
            .await
            .unwrap();

        coord.stop(&key).await.unwrap();
        wait_for_detach(&bridge, 1).await;
        assert!(coord.registry().find(&key).await.is_err());

        // Repeated stop is a no-op with no duplicate detach
        coord.stop(&key).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bridge.detached(), vec![key]);
    }

    #[tokio::test]
    async fn test_stop_without_attach_skips_detach() {
        let (coord, bridge) = coordinator();
        let key = push_key();

        // Server-initiated session never negotiated, so never attached
        coord
            .create_session(key.clone(), true, true, None)
            .await
            .unwrap();
        coord.stop(&key).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(bridge.detached().is_empty());
    }

    #[tokio::test]
    async fn test_answer_after_stop_fails() {
        let (coord, _) = coordinator();
        let key = push_key();

        coord
            .create_session(key.clone(), true, true, None)
            .await
            .unwrap();
        coord.stop(&key).await.unwrap();

        // The session is gone from the registry
        let err = coord.handle_answer(&key, "v=0".into()).await.unwrap_err();
        assert!(matches!(err, SignalingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attach_failure_keeps_session_negotiated() {
        let (coord, bridge) = coordinator();
        bridge.set_fail_attach(true);
        let key = push_key();
        let offer = sdp::offer(true, true);

        let err = coord
            .create_session(key.clone(), true, true, Some(offer))
            .await
            .unwrap_err();
        assert!(matches!(err, SignalingError::Bridge(_)));

        // Negotiated state survives the bridge failure
        let session = coord.registry().find(&key).await.unwrap();
        assert_eq!(session.read().await.state(), SessionState::Negotiated);

        // Stop still releases the attach-pending session
        coord.stop(&key).await.unwrap();
        wait_for_detach(&bridge, 1).await;
    }

    /// Bridge whose attach takes a while, like a real forwarding backend
    struct SlowBridge {
        delay: Duration,
    }

    #[async_trait]
    impl MediaBridge for SlowBridge {
        async fn attach(&self, _session: &SessionSnapshot) -> std::result::Result<(), BridgeError> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        async fn detach(&self, _key: &SessionKey) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_attach_does_not_stall_other_sessions() {
        let registry = Arc::new(SessionRegistry::new());
        let bridge = Arc::new(SlowBridge {
            delay: Duration::from_millis(500),
        });
        let coord = Arc::new(NegotiationCoordinator::new(
            registry,
            bridge as Arc<dyn MediaBridge>,
        ));
        let offer = sdp::offer(true, true);

        // First create parks in the slow attach
        let slow = {
            let coord = Arc::clone(&coord);
            let offer = offer.clone();
            tokio::spawn(
                async move { coord.create_session(push_key(), true, true, Some(offer)).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Re-push the same key while that attach is still in flight
        let repush = {
            let coord = Arc::clone(&coord);
            let offer = offer.clone();
            tokio::spawn(
                async move { coord.create_session(push_key(), true, true, Some(offer)).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A create on an independent key must not queue behind either one
        let started = std::time::Instant::now();
        coord
            .create_session(SessionKey::new("u9", "s9", Role::Publisher), true, true, None)
            .await
            .unwrap();
        assert!(
            started.elapsed() < Duration::from_millis(200),
            "independent create stalled behind a slow attach"
        );

        slow.await.unwrap().unwrap();
        repush.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_replacing_negotiated_session_detaches_old_one() {
        let (coord, bridge) = coordinator();
        let key = push_key();
        let offer = sdp::offer(true, true);

        coord
            .create_session(key.clone(), true, true, Some(offer.clone()))
            .await
            .unwrap();
        assert_eq!(bridge.attached().len(), 1);

        // Re-push without stopping first: default policy replaces
        coord
            .create_session(key.clone(), true, true, Some(offer))
            .await
            .unwrap();

        wait_for_detach(&bridge, 1).await;
        assert_eq!(bridge.attached().len(), 2);
        assert_eq!(coord.registry().session_count().await, 1);
    }
}
