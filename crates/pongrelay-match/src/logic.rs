//! Sync-number reconciliation and match-end detection.
//!
//! Two clients tick independently and each stamps its reports with a sync
//! number. The server never simulates; it only decides, per report, whose
//! view wins:
//!
//! - a side that reports a sync number behind its opponent's (by at least
//!   `sync_offset`) is **snapped**: its report is dropped and it is handed
//!   the current state unchanged;
//! - otherwise the report is **merged**: the sender's paddle is taken as
//!   is, the score only ever moves up, and the ball is taken from the left
//!   side alone so the two clients never fight over it.
//!
//! These are pure functions over values; the match actor is what makes a
//! round atomic.

use pongrelay_protocol::{ClientUpdate, Score, Side};

use crate::MatchState;

/// What reconciliation decided for one report.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The sender was behind; it adopts this state wholesale.
    Snap(MatchState),
    /// The sender's report was folded into this new state.
    Merge(MatchState),
}

impl Reconciliation {
    /// Returns `true` if the sender was snapped.
    pub fn is_snap(&self) -> bool {
        matches!(self, Self::Snap(_))
    }

    /// The state the match holds after this round.
    pub fn state(&self) -> &MatchState {
        match self {
            Self::Snap(s) | Self::Merge(s) => s,
        }
    }

    pub fn into_state(self) -> MatchState {
        match self {
            Self::Snap(s) | Self::Merge(s) => s,
        }
    }
}

/// Reconciles `update` from `side` against the current shared state.
///
/// `opponent_sync` is the last sync number the other side reported (or
/// adopted). A report is snapped when it is behind that number by at
/// least `sync_offset`; an offset of 0 is treated as 1.
pub fn reconcile(
    side: Side,
    update: &ClientUpdate,
    current: &MatchState,
    opponent_sync: u64,
    sync_offset: u64,
) -> Reconciliation {
    let lag = opponent_sync.saturating_sub(update.sync);
    if lag >= sync_offset.max(1) {
        return Reconciliation::Snap(current.clone());
    }

    let mut next = current.clone();
    next.sync = current.sync.max(update.sync);
    *next.paddle_mut(side) = update.paddle;
    if side == Side::Left {
        next.ball = update.ball;
    }
    next.score = current.score.max(update.score);
    Reconciliation::Merge(next)
}

/// Returns the winning side once either score reaches `win_score`.
///
/// Left is checked first, so if one update pushes both sides over the
/// line the left player takes the match.
pub fn winner(score: Score, win_score: u32) -> Option<Side> {
    if score.left >= win_score {
        Some(Side::Left)
    } else if score.right >= win_score {
        Some(Side::Right)
    } else {
        None
    }
}
