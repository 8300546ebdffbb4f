//! Match lifecycle management for pongrelay.
//!
//! Each match runs as an isolated Tokio task (actor model) that owns the
//! match's one shared [`MatchState`]. Both session workers of a match talk
//! to it through a [`MatchHandle`], so their read-reconcile-write rounds
//! are serialized per match without a lock spanning unrelated matches.
//!
//! # Key types
//!
//! - [`MatchRegistry`]: allocates match ids, assigns left/right slots
//! - [`MatchHandle`]: send commands to a running match actor
//! - [`MatchState`]: the authoritative snapshot of one match
//! - [`reconcile`]: the sync-number conflict resolution
//! - [`MatchPhase`]: lifecycle state machine
//! - [`MatchConfig`]: win score, sync tolerance, field size

mod actor;
mod config;
mod error;
mod logic;
mod registry;
mod state;

pub use actor::{MatchHandle, MatchInfo, MatchResult, RoundOutcome};
pub use config::{MatchConfig, MatchPhase};
pub use error::MatchError;
pub use logic::{reconcile, winner, Reconciliation};
pub use registry::{MatchRegistry, SlotAssignment};
pub use state::{MatchSlot, MatchState};
