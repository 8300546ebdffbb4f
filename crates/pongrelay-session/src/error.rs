//! Error types for the session layer.

use crate::SessionState;

/// Errors that can occur during session handling.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The declared name failed the format check. The connection is
    /// closed without a reply.
    #[error("invalid player name: {0:?}")]
    InvalidName(String),

    /// The name frame was not valid UTF-8.
    #[error("player name is not valid UTF-8")]
    NameNotUtf8,

    /// A state transition the worker lifecycle doesn't allow.
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },
}
