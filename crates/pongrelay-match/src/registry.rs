//! Match registry: allocates match ids and hands out slots.
//!
//! Pairing is strictly first-come: the first connection of a pair opens a
//! new match as `left`, the next one takes `right` in that same match, and
//! the one after that opens a fresh match. A match whose left player hangs
//! up before anyone joins is torn down, never re-paired.

use std::collections::HashMap;

use pongrelay_protocol::{MatchId, PlayerName, Side};

use crate::actor::spawn_match;
use crate::{MatchConfig, MatchError, MatchHandle, MatchInfo};

/// Where a connection was placed.
#[derive(Clone)]
pub struct SlotAssignment {
    pub match_id: MatchId,
    pub side: Side,
    pub handle: MatchHandle,
}

/// All in-progress matches, keyed by id.
///
/// Not thread-safe by itself; the server keeps it behind a mutex that is
/// only taken to assign or release slots. Gameplay rounds go straight to
/// each match's actor and never touch this lock.
pub struct MatchRegistry {
    matches: HashMap<MatchId, MatchHandle>,
    /// The match whose right slot is still open, if any.
    pending: Option<MatchId>,
    next_id: u64,
    config: MatchConfig,
}

impl MatchRegistry {
    /// Creates an empty registry whose matches use `config`.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            matches: HashMap::new(),
            pending: None,
            next_id: 1,
            config,
        }
    }

    /// The rules every match in this registry runs under.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Places a newly named connection into the next open slot.
    ///
    /// Fills the right side of the pending match if there is one,
    /// otherwise opens a new match with this player on the left.
    pub async fn assign(
        &mut self,
        name: PlayerName,
    ) -> Result<SlotAssignment, MatchError> {
        if let Some(match_id) = self.pending.take() {
            if let Some(handle) = self.matches.get(&match_id) {
                match handle.join(Side::Right, name.clone()).await {
                    Ok(()) => {
                        return Ok(SlotAssignment {
                            match_id,
                            side: Side::Right,
                            handle: handle.clone(),
                        });
                    }
                    Err(e) => {
                        tracing::debug!(
                            %match_id,
                            error = %e,
                            "pending match no longer joinable"
                        );
                    }
                }
            }
        }

        let match_id = self.create_match();
        let handle = self
            .matches
            .get(&match_id)
            .cloned()
            .ok_or(MatchError::NotFound(match_id))?;
        handle.join(Side::Left, name).await?;
        self.pending = Some(match_id);

        Ok(SlotAssignment {
            match_id,
            side: Side::Left,
            handle,
        })
    }

    /// Records that `side` of `match_id` disconnected. Once nobody is
    /// left connected the match is removed and its actor stopped.
    pub async fn leave(
        &mut self,
        match_id: MatchId,
        side: Side,
    ) -> Result<(), MatchError> {
        let handle = self
            .matches
            .get(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;

        let remaining = handle.leave(side).await?;
        if self.pending == Some(match_id) {
            self.pending = None;
        }
        if remaining == 0 {
            self.destroy_match(match_id).await?;
        }
        Ok(())
    }

    /// Shuts a match down and forgets it.
    pub async fn destroy_match(
        &mut self,
        match_id: MatchId,
    ) -> Result<(), MatchError> {
        let handle = self
            .matches
            .remove(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;
        if self.pending == Some(match_id) {
            self.pending = None;
        }

        let _ = handle.shutdown().await;
        tracing::info!(%match_id, "match torn down");
        Ok(())
    }

    /// Returns info about a specific match.
    pub async fn match_info(
        &self,
        match_id: MatchId,
    ) -> Result<MatchInfo, MatchError> {
        let handle = self
            .matches
            .get(&match_id)
            .ok_or(MatchError::NotFound(match_id))?;
        handle.info().await
    }

    /// The match currently waiting for its right player.
    pub fn pending(&self) -> Option<MatchId> {
        self.pending
    }

    /// Returns the number of live matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Lists all live match ids.
    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches.keys().copied().collect()
    }

    fn create_match(&mut self) -> MatchId {
        let match_id = MatchId(self.next_id);
        self.next_id += 1;
        let handle = spawn_match(match_id, self.config.clone());
        self.matches.insert(match_id, handle);
        tracing::info!(%match_id, "match created");
        match_id
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
