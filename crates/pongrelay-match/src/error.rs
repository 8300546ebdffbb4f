//! Error types for the match layer.

use pongrelay_protocol::{MatchId, Side};

use crate::MatchPhase;

/// Errors that can occur during match operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The match does not exist (never created, or already torn down).
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// Someone already holds this side of the match.
    #[error("{1} slot of match {0} is already taken")]
    SlotTaken(MatchId, Side),

    /// The match isn't exchanging rounds: still waiting for an opponent,
    /// or already finished or abandoned.
    #[error("match {match_id} is not active (phase {phase})")]
    NotActive { match_id: MatchId, phase: MatchPhase },

    /// The match is in a state that doesn't allow this operation.
    #[error("invalid match state for this operation: {0}")]
    InvalidState(String),

    /// The match's command channel is full or closed.
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),
}
