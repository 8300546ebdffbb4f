//! Match configuration and lifecycle state machine.

use pongrelay_protocol::Side;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Rules and dimensions shared by every match a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Points needed to win. The match ends on the first update whose
    /// merged score reaches this for either side.
    pub win_score: u32,

    /// Minimum sync divergence before a lagging side is snapped to the
    /// current state. 1 means any lag at all snaps.
    pub sync_offset: u64,

    /// Logical field height sent in the handshake.
    pub field_height: u32,

    /// Logical field width sent in the handshake.
    pub field_width: u32,

    /// Capacity of each match actor's command channel.
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            win_score: 5,
            sync_offset: 1,
            field_height: 480,
            field_width: 640,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// The lifecycle state of a match.
///
/// ```text
/// WaitingForOpponent → InProgress → Finished
///          │               │
///          └───────────────┴──→ Abandoned
/// ```
///
/// - **WaitingForOpponent**: left slot filled, right slot open. No
///   gameplay messages are exchanged.
/// - **InProgress**: both slots connected; rounds flow.
/// - **Finished**: a side reached the win score. Terminal.
/// - **Abandoned**: a side disconnected before the match finished.
///   Terminal; nobody is credited a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    WaitingForOpponent,
    InProgress,
    Finished { winner: Side },
    Abandoned,
}

impl MatchPhase {
    /// Returns `true` while rounds may be exchanged.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` once the match can never be active again.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Abandoned)
    }

    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::WaitingForOpponent, Self::InProgress)
                | (Self::WaitingForOpponent, Self::Abandoned)
                | (Self::InProgress, Self::Finished { .. })
                | (Self::InProgress, Self::Abandoned)
        )
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForOpponent => write!(f, "WaitingForOpponent"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished { winner } => write!(f, "Finished({winner})"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}
