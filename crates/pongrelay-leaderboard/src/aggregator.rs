//! The leaderboard aggregator: one task that owns the tally and the store.
//!
//! Session workers only ever hold a [`LeaderboardHandle`]. Every flush is
//! a read-merge-write cycle against the store, and because all of them
//! run inside this one task they are serialized process-wide.

use pongrelay_protocol::PlayerName;
use tokio::sync::{mpsc, oneshot};

use crate::{LeaderboardEntry, LeaderboardError, LeaderboardStore, Tally};

const CHANNEL_SIZE: usize = 64;

enum LeaderboardCommand {
    RecordWin {
        name: PlayerName,
    },
    /// Replies with the number of entries written.
    Flush {
        reply: oneshot::Sender<Result<usize, LeaderboardError>>,
    },
    Standings {
        reply: oneshot::Sender<Result<Vec<LeaderboardEntry>, LeaderboardError>>,
    },
    Shutdown,
}

/// Handle to the running aggregator. Cheap to clone.
#[derive(Clone)]
pub struct LeaderboardHandle {
    sender: mpsc::Sender<LeaderboardCommand>,
}

impl LeaderboardHandle {
    /// Credits one win to `name` in the in-memory tally.
    pub async fn record_win(&self, name: PlayerName) -> Result<(), LeaderboardError> {
        self.send(LeaderboardCommand::RecordWin { name }).await
    }

    /// Folds every pending win into the store. Returns the number of
    /// entries now persisted.
    ///
    /// On failure the pending wins are kept and retried on the next
    /// flush; the store is never overwritten with partial data.
    pub async fn flush(&self) -> Result<usize, LeaderboardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LeaderboardCommand::Flush { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| LeaderboardError::Unavailable)?
    }

    /// Persisted standings plus any wins not yet flushed, sorted.
    pub async fn standings(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LeaderboardCommand::Standings { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(|_| LeaderboardError::Unavailable)?
    }

    /// Stops the aggregator. Unflushed wins are dropped.
    pub async fn shutdown(&self) -> Result<(), LeaderboardError> {
        self.send(LeaderboardCommand::Shutdown).await
    }

    async fn send(&self, cmd: LeaderboardCommand) -> Result<(), LeaderboardError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| LeaderboardError::Unavailable)
    }
}

/// The aggregator task state.
pub struct Leaderboard<S> {
    store: S,
    pending: Tally,
    receiver: mpsc::Receiver<LeaderboardCommand>,
}

impl<S: LeaderboardStore> Leaderboard<S> {
    /// Spawns the aggregator over `store` and returns a handle to it.
    pub fn spawn(store: S) -> LeaderboardHandle {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let aggregator = Self {
            store,
            pending: Tally::new(),
            receiver: rx,
        };
        tokio::spawn(aggregator.run());
        LeaderboardHandle { sender: tx }
    }

    async fn run(mut self) {
        tracing::debug!("leaderboard aggregator started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                LeaderboardCommand::RecordWin { name } => {
                    tracing::debug!(name = %name, "win recorded");
                    self.pending.record_win(name);
                }
                LeaderboardCommand::Flush { reply } => {
                    let _ = reply.send(self.flush().await);
                }
                LeaderboardCommand::Standings { reply } => {
                    let _ = reply.send(self.standings().await);
                }
                LeaderboardCommand::Shutdown => break,
            }
        }

        if !self.pending.is_empty() {
            tracing::warn!(
                names = self.pending.len(),
                "leaderboard aggregator stopped with unflushed wins"
            );
        }
        tracing::debug!("leaderboard aggregator stopped");
    }

    async fn flush(&mut self) -> Result<usize, LeaderboardError> {
        let batch = self.pending.drain();
        match self.write_through(&batch).await {
            Ok(count) => {
                tracing::info!(entries = count, "leaderboard flushed");
                Ok(count)
            }
            Err(e) => {
                self.pending.absorb(batch);
                Err(e)
            }
        }
    }

    async fn write_through(&self, batch: &Tally) -> Result<usize, LeaderboardError> {
        let persisted = self.store.load().await?;
        let merged = batch.merge_into(persisted);
        self.store.save(&merged).await?;
        Ok(merged.len())
    }

    async fn standings(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let persisted = self.store.load().await?;
        Ok(self.pending.merge_into(persisted))
    }
}
