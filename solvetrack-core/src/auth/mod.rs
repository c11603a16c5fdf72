//! Authentication session layer
//!
//! The OIDC handshake itself is an external capability behind the
//! [`AuthProvider`] trait; this module owns everything downstream of it:
//! the process-wide [`SessionStore`] snapshot, its merge protocol, and the
//! replay-latest observer stream that data pipelines subscribe to.

pub mod provider;
pub mod session;

pub use provider::{AuthCheck, AuthProvider, StaticTokenProvider};
pub use session::{SessionEvents, SessionPhase, SessionSnapshot, SessionStore};
