//! Unified error type for the pongrelay server.

use pongrelay_leaderboard::LeaderboardError;
use pongrelay_match::MatchError;
use pongrelay_protocol::ProtocolError;
use pongrelay_session::SessionError;
use pongrelay_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PongRelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A name was rejected or a session moved illegally.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A match operation failed (not found, not active, gone).
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Reading or writing standings failed.
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),

    /// The process configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pongrelay_protocol::{MatchId, Side};

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let relay_err: PongRelayError = err.into();
        assert!(matches!(relay_err, PongRelayError::Transport(_)));
        assert!(relay_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let relay_err: PongRelayError = err.into();
        assert!(matches!(relay_err, PongRelayError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::InvalidName("abc!".into());
        let relay_err: PongRelayError = err.into();
        assert!(matches!(relay_err, PongRelayError::Session(_)));
    }

    #[test]
    fn test_from_match_error() {
        let err = MatchError::SlotTaken(MatchId(3), Side::Right);
        let relay_err: PongRelayError = err.into();
        assert!(matches!(relay_err, PongRelayError::Match(_)));
        assert!(relay_err.to_string().contains("M-3"));
    }

    #[test]
    fn test_from_leaderboard_error() {
        let relay_err: PongRelayError = LeaderboardError::Unavailable.into();
        assert!(matches!(relay_err, PongRelayError::Leaderboard(_)));
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::InvalidAddress("nowhere".into());
        let relay_err: PongRelayError = err.into();
        assert!(matches!(relay_err, PongRelayError::Config(_)));
        assert!(relay_err.to_string().contains("nowhere"));
    }
}
