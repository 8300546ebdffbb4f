//! Core protocol types for pongrelay's wire format.
//!
//! Every type here is either sent on the wire or embedded in something
//! that is. The JSON shapes are fixed by the clients:
//!
//! ```text
//! server → client (once):   {"side":"left","height":480,"width":640}
//! client → server (round):  {"sync":7,"paddle":[x,y],"ball":[x,y],"score":[l,r]}
//! server → client (round):  {"sync":7,"left":[x,y],"right":[x,y],"ball":[x,y],"score":[l,r]}
//! ```

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a match.
///
/// `#[serde(transparent)]` serializes `MatchId(3)` as plain `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// The name a player declared when connecting.
///
/// Construction does not validate; the session layer's authenticator is
/// the single place that decides which names are acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Wraps a name without checking it.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two fixed slots of a match.
///
/// Serialized in lowercase (`"left"`, `"right"`) to match the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Array index for per-side storage: left is 0, right is 1.
    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// A 2-component position in the server-dictated coordinate space.
///
/// On the wire this is a two-element array `[x, y]`, which is why serde
/// goes through `[f64; 2]` instead of deriving a struct shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Vector2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Vector2> for [f64; 2] {
    fn from(v: Vector2) -> Self {
        [v.x, v.y]
    }
}

/// Points scored so far: `left` is the left player's, `right` the right
/// player's. Wire shape is `[left, right]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub const fn new(left: u32, right: u32) -> Self {
        Self { left, right }
    }

    /// Component-wise maximum. Folding reports through this keeps both
    /// counters monotonically non-decreasing.
    pub fn max(self, other: Self) -> Self {
        Self {
            left: self.left.max(other.left),
            right: self.right.max(other.right),
        }
    }
}

impl From<[u32; 2]> for Score {
    fn from([left, right]: [u32; 2]) -> Self {
        Self { left, right }
    }
}

impl From<Score> for [u32; 2] {
    fn from(s: Score) -> Self {
        [s.left, s.right]
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Server → Client, once, right after the name is accepted.
///
/// Tells the client which paddle it controls and the logical field size
/// every position is expressed in, so both clients' reports are directly
/// comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub side: Side,
    pub height: u32,
    pub width: u32,
}

impl Handshake {
    pub fn new(side: Side, height: u32, width: u32) -> Self {
        Self {
            side,
            height,
            width,
        }
    }
}

/// Client → Server, once per round: the sender's own paddle plus its
/// local view of the ball and score, stamped with its sync number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub sync: u64,
    pub paddle: Vector2,
    pub ball: Vector2,
    pub score: Score,
}

/// Server → Client, once per round: the full authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub sync: u64,
    pub left: Vector2,
    pub right: Vector2,
    pub ball: Vector2,
    pub score: Score,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The clients parse these shapes by key and index, so the tests pin
    //! the exact JSON rather than just round-tripping.

    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&MatchId(9)).unwrap(), "9");
        assert_eq!(MatchId(9).to_string(), "M-9");
    }

    #[test]
    fn test_player_name_is_a_plain_string() {
        let name = PlayerName::new("abc123");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"abc123\"");
        assert_eq!(name.as_str(), "abc123");
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Side::Right).unwrap(), "\"right\"");
    }

    #[test]
    fn test_side_opponent_and_index() {
        assert_eq!(Side::Left.opponent(), Side::Right);
        assert_eq!(Side::Right.opponent(), Side::Left);
        assert_eq!(Side::Left.index(), 0);
        assert_eq!(Side::Right.index(), 1);
    }

    #[test]
    fn test_vector2_is_a_two_element_array() {
        let v = Vector2::new(10.0, 215.5);
        assert_eq!(serde_json::to_value(v).unwrap(), json!([10.0, 215.5]));
        let back: Vector2 = serde_json::from_str("[3, 4]").unwrap();
        assert_eq!(back, Vector2::new(3.0, 4.0));
    }

    #[test]
    fn test_score_is_left_then_right() {
        let s: Score = serde_json::from_str("[4, 2]").unwrap();
        assert_eq!(s.left, 4);
        assert_eq!(s.right, 2);
    }

    #[test]
    fn test_score_rejects_negative_points() {
        let result: Result<Score, _> = serde_json::from_str("[-1, 0]");
        assert!(result.is_err());
    }

    #[test]
    fn test_score_max_is_component_wise() {
        let a = Score::new(3, 1);
        let b = Score::new(2, 4);
        assert_eq!(a.max(b), Score::new(3, 4));
    }

    #[test]
    fn test_handshake_exact_json() {
        let hs = Handshake::new(Side::Left, 480, 640);
        assert_eq!(
            serde_json::to_string(&hs).unwrap(),
            r#"{"side":"left","height":480,"width":640}"#
        );
    }

    #[test]
    fn test_state_snapshot_json_shape() {
        let snap = StateSnapshot {
            sync: 7,
            left: Vector2::new(10.0, 20.0),
            right: Vector2::new(620.0, 30.0),
            ball: Vector2::new(320.0, 240.0),
            score: Score::new(1, 2),
        };
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["sync"], 7);
        assert_eq!(value["left"], json!([10.0, 20.0]));
        assert_eq!(value["right"], json!([620.0, 30.0]));
        assert_eq!(value["ball"], json!([320.0, 240.0]));
        assert_eq!(value["score"], json!([1, 2]));
    }

    #[test]
    fn test_client_update_missing_field_is_rejected() {
        let raw = r#"{"sync": 1, "paddle": [0, 0], "score": [0, 0]}"#;
        let result: Result<ClientUpdate, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_update_rejects_negative_sync() {
        let raw = r#"{"sync": -3, "paddle": [0, 0], "ball": [0, 0], "score": [0, 0]}"#;
        let result: Result<ClientUpdate, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
