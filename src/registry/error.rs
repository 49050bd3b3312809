//! Registry error types
//!
//! Error types for session registry operations.

use super::key::SessionKey;
use super::session::SessionState;

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// A non-stopped session already holds this key
    KeyConflict(SessionKey),
    /// No session under this key
    SessionNotFound(SessionKey),
    /// Attempted state regression or transition out of `Stopped`
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
    /// Local SDP was already set; renegotiation is not supported
    SdpAlreadySet,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::KeyConflict(key) => write!(f, "Session key conflict: {}", key),
            RegistryError::SessionNotFound(key) => write!(f, "Session not found: {}", key),
            RegistryError::InvalidTransition { from, to } => {
                write!(f, "Invalid state transition: {} -> {}", from, to)
            }
            RegistryError::SdpAlreadySet => write!(f, "Local SDP already set"),
        }
    }
}

impl std::error::Error for RegistryError {}
