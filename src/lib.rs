//! WebRTC push/pull signaling server
//!
//! A signaling core for live streaming: publishers push a stream, any
//! number of subscribers pull it. The crate negotiates the SDP offer/answer
//! exchange for both sides and hands finalized sessions to a pluggable
//! media bridge; it moves no media itself.
//!
//! # Architecture
//!
//! - [`registry`]: maps `(uid, stream name, role)` to live sessions,
//!   enforces key uniqueness, monotonic state transitions, and TTL eviction
//! - [`negotiate`]: drives the offer/answer handshake in both sequencing
//!   modes (server-originated and client-originated offers)
//! - [`bridge`]: the seam to the media-forwarding backend
//! - [`server`]: the HTTP endpoint layer speaking the
//!   `{errNo, errMsg, data}` wire contract
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use signal_rs::bridge::NullBridge;
//! use signal_rs::{ServerConfig, SignalingServer};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ServerConfig::default().bind("127.0.0.1:8080".parse().unwrap());
//!     let server = SignalingServer::new(config, Arc::new(NullBridge::new()));
//!     server.run().await
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod negotiate;
pub mod registry;
pub mod server;

pub use bridge::{BridgeError, MediaBridge};
pub use error::{Result, SignalingError};
pub use negotiate::{NegotiationCoordinator, SdpKind, SdpPayload};
pub use registry::{
    ConflictPolicy, Initiator, RegistryConfig, Role, Session, SessionKey, SessionRegistry,
    SessionState,
};
pub use server::{ApiResponse, ServerConfig, SignalingServer};
