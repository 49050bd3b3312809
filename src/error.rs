//! Crate-wide error types
//!
//! Every failure that can cross the endpoint boundary maps to one of these
//! variants, each with a stable wire code. Handlers never panic past this
//! boundary; all paths return a structured result.

use crate::registry::{RegistryError, SessionKey};

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, SignalingError>;

/// Error taxonomy for signaling operations
#[derive(Debug, Clone)]
pub enum SignalingError {
    /// Missing or malformed request fields, rejected before any session mutation
    Validation(String),
    /// A non-stopped session already holds this key
    AlreadyExists(SessionKey),
    /// Operation references a session that never existed or was already evicted
    NotFound(SessionKey),
    /// Operation is not valid for the session's current state
    InvalidState(String),
    /// Media bridge attach/detach failed; the session keeps its negotiated state
    Bridge(String),
}

impl SignalingError {
    /// Stable wire code for this error kind (`errNo` field)
    ///
    /// Zero is reserved for success.
    pub fn err_no(&self) -> i32 {
        match self {
            SignalingError::Validation(_) => -1,
            SignalingError::Bridge(_) => -2,
            SignalingError::NotFound(_) => -3,
            SignalingError::AlreadyExists(_) => -4,
            SignalingError::InvalidState(_) => -5,
        }
    }
}

impl std::fmt::Display for SignalingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalingError::Validation(msg) => write!(f, "invalid request: {}", msg),
            SignalingError::AlreadyExists(key) => {
                write!(f, "session already exists: {}", key)
            }
            SignalingError::NotFound(key) => write!(f, "session not found: {}", key),
            SignalingError::InvalidState(msg) => write!(f, "invalid session state: {}", msg),
            SignalingError::Bridge(msg) => write!(f, "media bridge error: {}", msg),
        }
    }
}

impl std::error::Error for SignalingError {}

impl From<RegistryError> for SignalingError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::KeyConflict(key) => SignalingError::AlreadyExists(key),
            RegistryError::SessionNotFound(key) => SignalingError::NotFound(key),
            RegistryError::InvalidTransition { .. } | RegistryError::SdpAlreadySet => {
                SignalingError::InvalidState(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Role;

    #[test]
    fn test_err_no_codes_are_stable() {
        let key = SessionKey::new("u1", "s1", Role::Publisher);

        assert_eq!(SignalingError::Validation("x".into()).err_no(), -1);
        assert_eq!(SignalingError::Bridge("x".into()).err_no(), -2);
        assert_eq!(SignalingError::NotFound(key.clone()).err_no(), -3);
        assert_eq!(SignalingError::AlreadyExists(key).err_no(), -4);
        assert_eq!(SignalingError::InvalidState("x".into()).err_no(), -5);
    }

    #[test]
    fn test_registry_error_conversion() {
        let key = SessionKey::new("u1", "s1", Role::Publisher);

        let err: SignalingError = RegistryError::KeyConflict(key.clone()).into();
        assert!(matches!(err, SignalingError::AlreadyExists(_)));

        let err: SignalingError = RegistryError::SessionNotFound(key).into();
        assert!(matches!(err, SignalingError::NotFound(_)));

        let err: SignalingError = RegistryError::SdpAlreadySet.into();
        assert!(matches!(err, SignalingError::InvalidState(_)));
    }
}
