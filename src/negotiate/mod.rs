//! Negotiation coordinator and SDP synthesis
//!
//! Executes the offer/answer handshake for a session independent of whether
//! it publishes or subscribes. The two historical push/pull client
//! generations (server-originated and client-originated offers) collapse to
//! one coordinator parameterized by role and initiator.

pub mod coordinator;
pub mod sdp;

pub use coordinator::{NegotiationCoordinator, SdpKind, SdpPayload};
pub use sdp::MediaKind;
