//! The per-match data model.

use pongrelay_protocol::{PlayerName, Score, Side, StateSnapshot, Vector2};

use crate::MatchConfig;

const PADDLE_HEIGHT: f64 = 50.0;
const PADDLE_INSET: f64 = 10.0;
const PADDLE_WIDTH: f64 = 10.0;

/// The authoritative snapshot of one match.
///
/// Treated as a value: reconciliation builds a new `MatchState` and the
/// match actor swaps it in whole, so no reader ever sees half an update.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    /// Sync number of the update that produced this state.
    pub sync: u64,
    pub left_paddle: Vector2,
    pub right_paddle: Vector2,
    pub ball: Vector2,
    pub score: Score,
    /// `true` from pairing until the match finishes or is abandoned.
    pub active: bool,
}

impl MatchState {
    /// Kickoff layout: paddles vertically centred just inside each edge,
    /// ball at the centre of the field.
    pub fn kickoff(config: &MatchConfig) -> Self {
        let width = f64::from(config.field_width);
        let height = f64::from(config.field_height);
        let paddle_y = height / 2.0 - PADDLE_HEIGHT / 2.0;
        Self {
            sync: 0,
            left_paddle: Vector2::new(PADDLE_INSET, paddle_y),
            right_paddle: Vector2::new(
                width - PADDLE_INSET - PADDLE_WIDTH,
                paddle_y,
            ),
            ball: Vector2::new(width / 2.0, height / 2.0),
            score: Score::default(),
            active: false,
        }
    }

    /// The paddle belonging to `side`.
    pub fn paddle(&self, side: Side) -> Vector2 {
        match side {
            Side::Left => self.left_paddle,
            Side::Right => self.right_paddle,
        }
    }

    pub(crate) fn paddle_mut(&mut self, side: Side) -> &mut Vector2 {
        match side {
            Side::Left => &mut self.left_paddle,
            Side::Right => &mut self.right_paddle,
        }
    }

    /// The wire form sent back to clients every round.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            sync: self.sync,
            left: self.left_paddle,
            right: self.right_paddle,
            ball: self.ball,
            score: self.score,
        }
    }
}

/// One side of a match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSlot {
    /// The name the player in this slot declared.
    pub player_name: PlayerName,
    /// The last sync number this side reported, or adopted on a snap.
    pub sync: u64,
    /// `true` once both slots are filled.
    pub ready: bool,
    /// `false` once this side's connection is gone.
    pub connected: bool,
}

impl MatchSlot {
    pub(crate) fn new(player_name: PlayerName) -> Self {
        Self {
            player_name,
            sync: 0,
            ready: false,
            connected: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kickoff_layout_for_default_field() {
        let state = MatchState::kickoff(&MatchConfig::default());
        assert_eq!(state.left_paddle, Vector2::new(10.0, 215.0));
        assert_eq!(state.right_paddle, Vector2::new(620.0, 215.0));
        assert_eq!(state.ball, Vector2::new(320.0, 240.0));
        assert_eq!(state.score, Score::new(0, 0));
        assert_eq!(state.sync, 0);
        assert!(!state.active);
    }

    #[test]
    fn test_snapshot_carries_every_field() {
        let mut state = MatchState::kickoff(&MatchConfig::default());
        state.sync = 9;
        state.score = Score::new(2, 3);
        let snap = state.snapshot();
        assert_eq!(snap.sync, 9);
        assert_eq!(snap.left, state.left_paddle);
        assert_eq!(snap.right, state.right_paddle);
        assert_eq!(snap.ball, state.ball);
        assert_eq!(snap.score, Score::new(2, 3));
    }

    #[test]
    fn test_paddle_by_side() {
        let state = MatchState::kickoff(&MatchConfig::default());
        assert_eq!(state.paddle(Side::Left), state.left_paddle);
        assert_eq!(state.paddle(Side::Right), state.right_paddle);
    }
}
