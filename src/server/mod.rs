//! Signaling endpoint layer
//!
//! Translates the wire operations (push, pull, sendanswer, stoppush,
//! stoppull) into registry and coordinator calls. Each operation is a
//! single synchronous request/response; there is no server push and no
//! long-lived connection.

pub mod api;
pub mod config;
pub mod http;

pub use api::{AnswerParams, ApiResponse, CreateParams, SdpData, StopParams};
pub use config::ServerConfig;
pub use http::{AnyForm, SignalingServer};
