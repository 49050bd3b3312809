//! Session identity types
//!
//! A session is identified by `(uid, stream name, role)`. A user may hold at
//! most one active session per role per stream name.

/// Role of a session: whether the endpoint contributes or receives media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Contributes media (push)
    Publisher,
    /// Receives media (pull)
    Subscriber,
}

impl Role {
    /// Wire name used by the `type` field of sendanswer requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Publisher => "push",
            Role::Subscriber => "pull",
        }
    }

    /// Parse the wire name ("push" or "pull")
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "push" => Some(Role::Publisher),
            "pull" => Some(Role::Subscriber),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for a session (uid + stream name + role)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Caller-supplied user identity
    pub uid: String,
    /// Stream identifier
    pub stream_name: String,
    /// Publish or subscribe side
    pub role: Role,
}

impl SessionKey {
    /// Create a new session key
    pub fn new(uid: impl Into<String>, stream_name: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            stream_name: stream_name.into(),
            role,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.uid, self.stream_name, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::Publisher.as_str(), "push");
        assert_eq!(Role::Subscriber.as_str(), "pull");
        assert_eq!(Role::parse("push"), Some(Role::Publisher));
        assert_eq!(Role::parse("pull"), Some(Role::Subscriber));
        assert_eq!(Role::parse("bogus"), None);
    }

    #[test]
    fn test_keys_differ_by_role() {
        let push = SessionKey::new("u1", "s1", Role::Publisher);
        let pull = SessionKey::new("u1", "s1", Role::Subscriber);

        assert_ne!(push, pull);
        assert_eq!(push.to_string(), "u1/s1/push");
    }
}
