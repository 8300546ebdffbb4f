//! Player sessions for pongrelay.
//!
//! This crate handles who a connection is and where it is in its life:
//!
//! 1. **Name check**: deciding whether a declared name is acceptable
//!    ([`Authenticator`] trait, [`AlphanumericNames`] default)
//! 2. **Session state**: the per-connection state machine a session
//!    worker walks through ([`Session`], [`SessionState`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Match Layer (above)  ← a session is bound to one slot of one match
//!     ↕
//! Session Layer (this crate)  ← identity and worker lifecycle
//!     ↕
//! Protocol Layer (below)  ← provides PlayerName, Side, MatchId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod session;

pub use auth::{AlphanumericNames, Authenticator};
pub use error::SessionError;
pub use session::{Session, SessionState};
