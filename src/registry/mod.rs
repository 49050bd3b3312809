//! Session registry for signaling sessions
//!
//! The registry maps `(uid, stream name, role)` keys to live publish or
//! subscribe sessions and enforces uniqueness and lifecycle: at most one
//! non-stopped session per key, monotonic state transitions, and TTL
//! eviction of sessions stuck mid-negotiation.
//!
//! # Architecture
//!
//! ```text
//!                     Arc<SessionRegistry>
//!               ┌───────────────────────────────┐
//!               │ sessions: HashMap<SessionKey, │
//!               │   Arc<RwLock<Session>>        │
//!               │ >                             │
//!               └──────────────┬────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!     [push handler]     [sendanswer handler]  [stop handler]
//!     create()           find()                remove()
//! ```
//!
//! Lock order is always the session map first, then an individual session.
//! Same-key create/sendanswer/stop races serialize deterministically on the
//! map lock; the loser observes the winner's state.

pub mod config;
pub mod error;
pub mod key;
pub mod session;
pub mod store;

pub use config::{ConflictPolicy, RegistryConfig};
pub use error::RegistryError;
pub use key::{Role, SessionKey};
pub use session::{Initiator, Session, SessionSnapshot, SessionState};
pub use store::SessionRegistry;
