//! In-memory win counting and the merge into persisted standings.

use std::cmp::Reverse;
use std::collections::HashMap;

use pongrelay_protocol::PlayerName;
use serde::{Deserialize, Serialize};

/// One row of the persisted leaderboard.
///
/// Serialized as `{"name": "...", "score": N}` where `score` is the
/// player's cumulative number of match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: PlayerName,
    pub score: u64,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: u64) -> Self {
        Self {
            name: PlayerName::new(name),
            score,
        }
    }
}

/// Wins recorded since the last flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    wins: HashMap<PlayerName, u64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits one win to `name`, creating its entry if unseen.
    pub fn record_win(&mut self, name: PlayerName) {
        *self.wins.entry(name).or_insert(0) += 1;
    }

    /// Wins recorded for `name` so far.
    pub fn wins(&self, name: &PlayerName) -> u64 {
        self.wins.get(name).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }

    /// Number of distinct names with at least one win.
    pub fn len(&self) -> usize {
        self.wins.len()
    }

    /// Takes every recorded win, leaving this tally empty.
    pub fn drain(&mut self) -> Tally {
        std::mem::take(self)
    }

    /// Adds `other`'s wins into this tally.
    pub fn absorb(&mut self, other: Tally) {
        for (name, wins) in other.wins {
            *self.wins.entry(name).or_insert(0) += wins;
        }
    }

    /// Adds these wins to `persisted` and returns the merged standings,
    /// sorted.
    ///
    /// Entries are keyed by name; a name that appears more than once in
    /// `persisted` has its rows summed.
    pub fn merge_into(&self, persisted: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
        let mut totals: HashMap<PlayerName, u64> = HashMap::with_capacity(persisted.len());
        for entry in persisted {
            *totals.entry(entry.name).or_insert(0) += entry.score;
        }
        for (name, wins) in &self.wins {
            *totals.entry(name.clone()).or_insert(0) += wins;
        }

        let mut merged: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(name, score)| LeaderboardEntry { name, score })
            .collect();
        sort_standings(&mut merged);
        merged
    }
}

/// Orders standings by wins, highest first, then by name.
pub fn sort_standings(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        Reverse(a.score)
            .cmp(&Reverse(b.score))
            .then_with(|| a.name.cmp(&b.name))
    });
}
