//! Session types: the server's record of one connected player.
//!
//! A session knows WHO the player is, WHERE they sit (match and side) and
//! WHAT phase their worker is in. It is owned by the connection's handler
//! task; nothing else mutates it.

use std::fmt;
use std::time::{Duration, Instant};

use pongrelay_protocol::{MatchId, PlayerName, Side};
use pongrelay_transport::ConnectionId;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle of a session worker.
///
/// ```text
///   AwaitingPairing ──(opponent joined)──→ Active ──(match over)──→ Terminated
///         │                                                            ↑
///         └─────────────────(disconnect before pairing)────────────────┘
/// ```
///
/// - **AwaitingPairing**: slot assigned, handshake sent, no gameplay yet.
/// - **Active**: both slots connected; rounds are exchanged.
/// - **Terminated**: the connection is closing. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingPairing,
    Active,
    Terminated,
}

impl SessionState {
    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::AwaitingPairing, Self::Active)
                | (Self::AwaitingPairing, Self::Terminated)
                | (Self::Active, Self::Terminated)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingPairing => write!(f, "AwaitingPairing"),
            Self::Active => write!(f, "Active"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session, from slot assignment to close.
#[derive(Debug, Clone)]
pub struct Session {
    /// The transport connection this session rides on.
    pub conn_id: ConnectionId,
    /// The name the player declared.
    pub name: PlayerName,
    /// The match this session is bound to.
    pub match_id: MatchId,
    /// Which paddle this player controls.
    pub side: Side,
    state: SessionState,
    rounds: u64,
    started: Instant,
}

impl Session {
    /// Creates a session for a freshly assigned slot.
    pub fn new(
        conn_id: ConnectionId,
        name: PlayerName,
        match_id: MatchId,
        side: Side,
    ) -> Self {
        Self {
            conn_id,
            name,
            match_id,
            side,
            state: SessionState::AwaitingPairing,
            rounds: 0,
            started: Instant::now(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Moves to `Active` once the match is fully staffed.
    ///
    /// # Errors
    /// [`SessionError::InvalidTransition`] unless the session is
    /// `AwaitingPairing`.
    pub fn activate(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Active)
    }

    /// Moves to `Terminated`. Calling it twice is a no-op.
    pub fn terminate(&mut self) {
        if self.state != SessionState::Terminated {
            self.state = SessionState::Terminated;
            tracing::debug!(
                conn_id = %self.conn_id,
                match_id = %self.match_id,
                side = %self.side,
                rounds = self.rounds,
                "session terminated"
            );
        }
    }

    /// Counts one completed round trip.
    pub fn record_round(&mut self) {
        self.rounds += 1;
    }

    /// Number of completed round trips.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Time since the slot was assigned.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn transition(&mut self, to: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
