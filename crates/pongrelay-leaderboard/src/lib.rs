//! Leaderboard aggregation for pongrelay.
//!
//! Wins are tallied in memory as matches finish and folded into a durable
//! store on every flush. The store is a full-rewrite file, not an append
//! log, so every read-modify-write cycle goes through a single aggregator
//! task; two matches finishing at once can never lose each other's wins.
//!
//! # Key types
//!
//! - [`Tally`]: wins recorded this process run, not yet persisted
//! - [`LeaderboardStore`]: where standings live between runs
//! - [`JsonFileStore`]: the JSON file implementation
//! - [`Leaderboard`] / [`LeaderboardHandle`]: the single-writer aggregator

mod aggregator;
mod error;
mod store;
mod tally;

pub use aggregator::{Leaderboard, LeaderboardHandle};
pub use error::LeaderboardError;
pub use store::{JsonFileStore, LeaderboardStore, MemoryStore};
pub use tally::{LeaderboardEntry, Tally, sort_standings};
