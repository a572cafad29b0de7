//! # chair-session
//!
//! Session bootstrap and identity resolution.
//!
//! [`SessionBootstrap`] answers "who is signed in, which chapter are they in,
//! and what role do they hold" and republishes the answer through a
//! [`state::SessionStore`] whenever the identity provider reports a change.
//! It provisions a profile the first time a confirmed identity is seen
//! without one, and always finishes a resolution within its timeouts.

pub mod bootstrap;
pub mod deadline;
pub mod error;
pub mod messages;
pub mod state;

pub use bootstrap::{ResolverTimeouts, SessionBootstrap, SignUpOutcome, SignUpRequest};
pub use error::SessionError;
pub use messages::{AuthFailure, FailureKind};
pub use state::{SessionState, SessionStore};
