//! # pongrelay
//!
//! Authoritative relay server for two-player pong.
//!
//! Clients connect over TCP, declare a name, and are paired first-come
//! into matches. Each client then streams its view of the game; the
//! server reconciles both views by sync number, answers every update with
//! the full authoritative state, detects the winning score, and folds wins
//! into a leaderboard file that survives restarts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pongrelay::prelude::*;
//!
//! # async fn start() -> Result<(), PongRelayError> {
//! let server = PongRelayServer::builder()
//!     .bind("0.0.0.0:7777")
//!     .build(AlphanumericNames)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::PongRelayError;
pub use server::{PongRelayServer, PongRelayServerBuilder};

/// The types most servers need, in one import.
pub mod prelude {
    pub use crate::{ConfigError, PongRelayError, PongRelayServer, ServerConfig};
    pub use pongrelay_leaderboard::{
        JsonFileStore, Leaderboard, LeaderboardEntry, LeaderboardHandle, MemoryStore,
    };
    pub use pongrelay_match::{MatchConfig, MatchPhase};
    pub use pongrelay_protocol::{
        ClientUpdate, Handshake, MatchId, PlayerName, Score, Side, StateSnapshot, Vector2,
    };
    pub use pongrelay_session::{AlphanumericNames, Authenticator, SessionError};
}
