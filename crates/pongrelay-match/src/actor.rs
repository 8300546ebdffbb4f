//! Match actor: an isolated Tokio task that owns one match.
//!
//! Each match runs in its own task and is reached only through an mpsc
//! channel. The actor handles one command at a time, so a round from the
//! left side and a round from the right side can never interleave: each
//! sees a fully formed state and leaves a fully formed state behind.
//!
//! Phase changes are published on a `watch` channel. Session workers
//! block on it while waiting for an opponent and race it against their
//! socket reads while playing, so a finished or abandoned match stops
//! both workers promptly.

use pongrelay_protocol::{ClientUpdate, MatchId, PlayerName, Score, Side, StateSnapshot};
use tokio::sync::{mpsc, oneshot, watch};

use crate::logic::{reconcile, winner};
use crate::{MatchConfig, MatchError, MatchPhase, MatchSlot, MatchState};

/// The result of one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    /// The authoritative state after the round, to send back in full.
    pub snapshot: StateSnapshot,
    /// `true` if the sender's report was dropped because it lagged.
    pub snapped: bool,
    /// Set only on the round that ended the match.
    pub finished: Option<MatchResult>,
}

/// How a finished match ended.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub winner: Side,
    pub winner_name: PlayerName,
    pub score: Score,
}

/// A snapshot of match metadata and state, for inspection.
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub match_id: MatchId,
    pub phase: MatchPhase,
    pub left: Option<MatchSlot>,
    pub right: Option<MatchSlot>,
    pub state: MatchState,
}

impl MatchInfo {
    /// The slot for `side`, if someone took it.
    pub fn slot(&self, side: Side) -> Option<&MatchSlot> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }
}

/// Commands sent to a match actor through its channel.
///
/// The `oneshot::Sender` in each variant is the reply channel.
pub(crate) enum MatchCommand {
    /// Fill a slot with a newly connected player.
    Join {
        side: Side,
        name: PlayerName,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    /// Reconcile and merge one client report.
    Update {
        side: Side,
        update: ClientUpdate,
        reply: oneshot::Sender<Result<RoundOutcome, MatchError>>,
    },

    /// A side's connection is gone. Replies with how many sides are
    /// still connected.
    Leave {
        side: Side,
        reply: oneshot::Sender<usize>,
    },

    /// Request match metadata and state.
    GetInfo { reply: oneshot::Sender<MatchInfo> },

    /// Stop the actor.
    Shutdown,
}

/// Handle to a running match actor.
///
/// Cheap to clone: an `mpsc::Sender` plus a `watch::Receiver`. The
/// registry holds one, and each session worker holds one.
#[derive(Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand>,
    phase: watch::Receiver<MatchPhase>,
}

impl MatchHandle {
    /// Returns the match's id.
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// The phase as of the last published change.
    pub fn phase(&self) -> MatchPhase {
        *self.phase.borrow()
    }

    /// A receiver that observes every phase change of this match.
    pub fn subscribe(&self) -> watch::Receiver<MatchPhase> {
        self.phase.clone()
    }

    /// Puts `name` into the `side` slot.
    pub async fn join(
        &self,
        side: Side,
        name: PlayerName,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::Join {
            side,
            name,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    /// Submits one client report and returns the authoritative result.
    pub async fn submit(
        &self,
        side: Side,
        update: ClientUpdate,
    ) -> Result<RoundOutcome, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::Update {
            side,
            update,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))?
    }

    /// Marks `side` as disconnected. Returns the number of sides still
    /// connected.
    pub async fn leave(&self, side: Side) -> Result<usize, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::Leave {
            side,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }

    /// Requests the current match info.
    pub async fn info(&self) -> Result<MatchInfo, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MatchCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }

    /// Tells the match actor to stop.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.send(MatchCommand::Shutdown).await
    }

    async fn send(&self, cmd: MatchCommand) -> Result<(), MatchError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| MatchError::Unavailable(self.match_id))
    }
}

/// The internal match actor state. Runs inside a Tokio task.
struct MatchActor {
    match_id: MatchId,
    config: MatchConfig,
    slots: [Option<MatchSlot>; 2],
    state: MatchState,
    phase: watch::Sender<MatchPhase>,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl MatchActor {
    /// Runs the actor loop, processing commands until shutdown or until
    /// every handle is dropped.
    async fn run(mut self) {
        tracing::debug!(match_id = %self.match_id, "match actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MatchCommand::Join { side, name, reply } => {
                    let _ = reply.send(self.handle_join(side, name));
                }
                MatchCommand::Update {
                    side,
                    update,
                    reply,
                } => {
                    let _ = reply.send(self.handle_update(side, update));
                }
                MatchCommand::Leave { side, reply } => {
                    let _ = reply.send(self.handle_leave(side));
                }
                MatchCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                MatchCommand::Shutdown => {
                    break;
                }
            }
        }

        tracing::debug!(match_id = %self.match_id, "match actor stopped");
    }

    fn current_phase(&self) -> MatchPhase {
        *self.phase.borrow()
    }

    fn set_phase(&mut self, next: MatchPhase) {
        let current = self.current_phase();
        if !current.can_transition_to(next) {
            tracing::warn!(
                match_id = %self.match_id,
                from = %current,
                to = %next,
                "ignoring invalid phase transition"
            );
            return;
        }
        self.phase.send_replace(next);
    }

    fn handle_join(
        &mut self,
        side: Side,
        name: PlayerName,
    ) -> Result<(), MatchError> {
        let phase = self.current_phase();
        if phase != MatchPhase::WaitingForOpponent {
            return Err(MatchError::InvalidState(format!(
                "cannot join match {} in phase {phase}",
                self.match_id
            )));
        }
        if self.slots[side.index()].is_some() {
            return Err(MatchError::SlotTaken(self.match_id, side));
        }

        tracing::info!(
            match_id = %self.match_id,
            %side,
            name = %name,
            "player took slot"
        );
        self.slots[side.index()] = Some(MatchSlot::new(name));

        if self.slots.iter().all(Option::is_some) {
            for slot in self.slots.iter_mut().flatten() {
                slot.ready = true;
            }
            self.state.active = true;
            self.set_phase(MatchPhase::InProgress);
            tracing::info!(match_id = %self.match_id, "match paired, starting");
        }

        Ok(())
    }

    fn handle_update(
        &mut self,
        side: Side,
        update: ClientUpdate,
    ) -> Result<RoundOutcome, MatchError> {
        let phase = self.current_phase();
        if !phase.is_active() {
            return Err(MatchError::NotActive {
                match_id: self.match_id,
                phase,
            });
        }

        let opponent_sync = self.slots[side.opponent().index()]
            .as_ref()
            .map_or(0, |slot| slot.sync);
        let reported_sync = update.sync;
        let outcome = reconcile(
            side,
            &update,
            &self.state,
            opponent_sync,
            self.config.sync_offset,
        );
        let snapped = outcome.is_snap();
        if snapped {
            tracing::debug!(
                match_id = %self.match_id,
                %side,
                reported_sync,
                opponent_sync,
                "lagging side snapped to current state"
            );
        }

        if let Some(slot) = self.slots[side.index()].as_mut() {
            slot.sync = if snapped { opponent_sync } else { reported_sync };
        }
        self.state = outcome.into_state();

        let finished = match winner(self.state.score, self.config.win_score) {
            Some(winning_side) => {
                self.state.active = false;
                self.set_phase(MatchPhase::Finished {
                    winner: winning_side,
                });
                let winner_name = self.slots[winning_side.index()]
                    .as_ref()
                    .map(|slot| slot.player_name.clone())
                    .ok_or_else(|| {
                        MatchError::InvalidState(format!(
                            "match {} finished with an empty {winning_side} slot",
                            self.match_id
                        ))
                    })?;
                tracing::info!(
                    match_id = %self.match_id,
                    winner = %winning_side,
                    name = %winner_name,
                    left = self.state.score.left,
                    right = self.state.score.right,
                    "match finished"
                );
                Some(MatchResult {
                    match_id: self.match_id,
                    winner: winning_side,
                    winner_name,
                    score: self.state.score,
                })
            }
            None => None,
        };

        Ok(RoundOutcome {
            snapshot: self.state.snapshot(),
            snapped,
            finished,
        })
    }

    fn handle_leave(&mut self, side: Side) -> usize {
        if let Some(slot) = self.slots[side.index()].as_mut() {
            slot.connected = false;
        }

        let phase = self.current_phase();
        if !phase.is_over() {
            self.state.active = false;
            self.set_phase(MatchPhase::Abandoned);
            tracing::info!(
                match_id = %self.match_id,
                %side,
                was = %phase,
                "player left, match abandoned"
            );
        }

        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.connected)
            .count()
    }

    fn info(&self) -> MatchInfo {
        let [left, right] = self.slots.clone();
        MatchInfo {
            match_id: self.match_id,
            phase: self.current_phase(),
            left,
            right,
            state: self.state.clone(),
        }
    }
}

/// Spawns a new match actor task and returns a handle to it.
///
/// `config.channel_size` bounds the command queue; senders wait when it
/// is full.
pub(crate) fn spawn_match(match_id: MatchId, config: MatchConfig) -> MatchHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let (phase_tx, phase_rx) = watch::channel(MatchPhase::WaitingForOpponent);

    let actor = MatchActor {
        match_id,
        state: MatchState::kickoff(&config),
        config,
        slots: [None, None],
        phase: phase_tx,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        sender: tx,
        phase: phase_rx,
    }
}
