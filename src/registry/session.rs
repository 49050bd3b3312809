//! Session record and state machine
//!
//! This module defines the per-session state stored in the registry.
//! State transitions are monotonic; `Stopped` is terminal and reachable
//! from any state.

use std::time::Instant;

use super::error::RegistryError;
use super::key::SessionKey;

/// Negotiation state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session created, no SDP exchanged yet
    Created,
    /// Server synthesized an offer and returned it to the client
    OfferSent,
    /// Offer delivered, waiting for the client's answer
    AwaitingAnswer,
    /// Offer/answer exchange complete
    Negotiated,
    /// Terminal state; the session is about to be evicted
    Stopped,
}

impl SessionState {
    /// Ordering rank used to enforce monotonic transitions
    fn rank(&self) -> u8 {
        match self {
            SessionState::Created => 0,
            SessionState::OfferSent => 1,
            SessionState::AwaitingAnswer => 2,
            SessionState::Negotiated => 3,
            SessionState::Stopped => 4,
        }
    }

    /// Whether the session still waits on negotiation to complete
    ///
    /// Pending sessions are subject to TTL eviction.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            SessionState::Created | SessionState::OfferSent | SessionState::AwaitingAnswer
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Created => "created",
            SessionState::OfferSent => "offer_sent",
            SessionState::AwaitingAnswer => "awaiting_answer",
            SessionState::Negotiated => "negotiated",
            SessionState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Which side originated the SDP offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initiator {
    /// Legacy flow: the server synthesizes the offer on create
    Server,
    /// Current flow: the create request carries the client's offer
    Client,
}

/// One media stream endpoint under negotiation
///
/// Sessions are only reachable through the registry; there is no
/// process-wide mutable state besides the registry map itself.
#[derive(Debug)]
pub struct Session {
    /// Identity key
    pub key: SessionKey,

    /// Which side generated the offer
    pub initiator: Initiator,

    /// Negotiated media kinds
    pub want_audio: bool,
    pub want_video: bool,

    /// Current negotiation state
    state: SessionState,

    /// SDP this server generated (offer or answer), set at most once
    local_sdp: Option<String>,

    /// SDP received from the client (offer or answer)
    remote_sdp: Option<String>,

    /// When the session was created (drives TTL eviction)
    pub created_at: Instant,

    /// Whether the media bridge attach was invoked
    attach_invoked: bool,

    /// Whether the media bridge detach was invoked
    detach_invoked: bool,
}

impl Session {
    /// Create a new session in the `Created` state
    pub fn new(key: SessionKey, initiator: Initiator, want_audio: bool, want_video: bool) -> Self {
        Self {
            key,
            initiator,
            want_audio,
            want_video,
            state: SessionState::Created,
            local_sdp: None,
            remote_sdp: None,
            created_at: Instant::now(),
            attach_invoked: false,
            detach_invoked: false,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Locally generated SDP, if any
    pub fn local_sdp(&self) -> Option<&str> {
        self.local_sdp.as_deref()
    }

    /// Client-supplied SDP, if any
    pub fn remote_sdp(&self) -> Option<&str> {
        self.remote_sdp.as_deref()
    }

    /// Advance the state machine
    ///
    /// Transitions must be strictly forward; `Stopped` is accepted from any
    /// non-stopped state. A regression or repeat returns `InvalidTransition`.
    pub fn advance(&mut self, to: SessionState) -> Result<(), RegistryError> {
        if to == SessionState::Stopped {
            self.state = SessionState::Stopped;
            return Ok(());
        }

        if self.state == SessionState::Stopped || to.rank() <= self.state.rank() {
            return Err(RegistryError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        self.state = to;
        Ok(())
    }

    /// Store the locally generated SDP
    ///
    /// Renegotiation is not supported: a second call fails.
    pub fn set_local_sdp(&mut self, sdp: String) -> Result<(), RegistryError> {
        if self.local_sdp.is_some() {
            return Err(RegistryError::SdpAlreadySet);
        }
        self.local_sdp = Some(sdp);
        Ok(())
    }

    /// Store the SDP received from the client
    pub fn set_remote_sdp(&mut self, sdp: String) {
        self.remote_sdp = Some(sdp);
    }

    /// Mark the bridge attach invoked; returns false if already marked
    pub fn mark_attach_invoked(&mut self) -> bool {
        if self.attach_invoked {
            return false;
        }
        self.attach_invoked = true;
        true
    }

    /// Whether attach was invoked for this session
    pub fn attach_invoked(&self) -> bool {
        self.attach_invoked
    }

    /// Mark the bridge detach invoked; returns false if already marked
    pub fn mark_detach_invoked(&mut self) -> bool {
        if self.detach_invoked {
            return false;
        }
        self.detach_invoked = true;
        true
    }

    /// Session age, for TTL eviction
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Snapshot for handing to the media bridge
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            key: self.key.clone(),
            want_audio: self.want_audio,
            want_video: self.want_video,
            local_sdp: self.local_sdp.clone(),
            remote_sdp: self.remote_sdp.clone(),
        }
    }
}

/// Immutable copy of the negotiated session handed to the media bridge
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Identity key
    pub key: SessionKey,
    /// Negotiated media kinds
    pub want_audio: bool,
    pub want_video: bool,
    /// SDP this server generated
    pub local_sdp: Option<String>,
    /// SDP received from the client
    pub remote_sdp: Option<String>,
}
