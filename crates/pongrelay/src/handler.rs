//! Per-connection handler: the session worker.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive the player's name → check it, or close silently
//!   2. Take the next open slot → send the handshake (side + field size)
//!   3. Wait for the opponent, watching for an early hang-up
//!   4. Loop: receive update → reconcile in the match actor → send the
//!      authoritative state back, until the match ends or either side
//!      goes away

use std::sync::Arc;

use pongrelay_leaderboard::LeaderboardHandle;
use pongrelay_match::{MatchError, MatchHandle, MatchPhase, MatchResult};
use pongrelay_protocol::{ClientUpdate, Codec, Handshake, MatchId, PlayerName, ProtocolError, Side};
use pongrelay_session::{Authenticator, Session};
use pongrelay_transport::{Connection, TcpConnection};
use tokio::sync::watch;

use crate::server::ServerState;
use crate::PongRelayError;

/// Drop guard that gives a slot back when the handler exits.
///
/// The normal exit path calls [`release`](Self::release), which frees the
/// slot before the handler returns. If the handler bails out early or
/// panics, `Drop` spawns a fire-and-forget task for the async lock instead.
struct SlotGuard<A: Authenticator, C: Codec> {
    match_id: MatchId,
    side: Side,
    state: Arc<ServerState<A, C>>,
    armed: bool,
}

impl<A: Authenticator, C: Codec> SlotGuard<A, C> {
    /// Frees the slot now, so the next assignment no longer sees it.
    async fn release(mut self) {
        self.armed = false;
        let mut registry = self.state.registry.lock().await;
        if let Err(e) = registry.leave(self.match_id, self.side).await {
            tracing::debug!(match_id = %self.match_id, side = %self.side, error = %e, "slot release failed");
        }
    }
}

impl<A: Authenticator, C: Codec> Drop for SlotGuard<A, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let match_id = self.match_id;
        let side = self.side;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            if let Err(e) = registry.leave(match_id, side).await {
                tracing::debug!(%match_id, %side, error = %e, "slot release failed");
            }
        });
    }
}

/// How the wait for an opponent ended.
enum Pairing {
    /// Both slots are filled. Carries the most recent update the client
    /// sent while waiting, if any.
    Ready { early: Option<Vec<u8>> },
    /// The match was torn down before it started.
    Abandoned,
    /// The client hung up first.
    Disconnected,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: TcpConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), PongRelayError>
where
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    // --- Step 1: Name ---
    let name = match read_name(&conn, &state).await {
        Ok(name) => name,
        Err(e) => {
            // Bad or missing names are closed without a reply.
            tracing::debug!(%conn_id, error = %e, "closing connection before slot assignment");
            let _ = conn.close().await;
            return Ok(());
        }
    };

    // --- Step 2: Slot + handshake ---
    let (assignment, handshake) = {
        let mut registry = state.registry.lock().await;
        let assignment = registry.assign(name.clone()).await?;
        let config = registry.config();
        let handshake = Handshake::new(assignment.side, config.field_height, config.field_width);
        (assignment, handshake)
    };
    let guard = SlotGuard {
        match_id: assignment.match_id,
        side: assignment.side,
        state: Arc::clone(&state),
        armed: true,
    };

    let mut session = Session::new(conn_id, name, assignment.match_id, assignment.side);
    tracing::info!(
        %conn_id,
        match_id = %session.match_id,
        side = %session.side,
        name = %session.name,
        "player assigned"
    );

    let result = play(&conn, &state, &assignment.handle, &mut session, &handshake).await;

    // A left player who hung up while waiting must be gone from `pending`
    // before anyone else can be assigned.
    guard.release().await;
    session.terminate();
    let _ = conn.close().await;
    tracing::info!(
        %conn_id,
        match_id = %session.match_id,
        side = %session.side,
        rounds = session.rounds(),
        elapsed_ms = session.elapsed().as_millis() as u64,
        "session ended"
    );

    result
}

/// Reads the first frame and checks it as a player name.
async fn read_name<A, C>(
    conn: &TcpConnection,
    state: &Arc<ServerState<A, C>>,
) -> Result<PlayerName, PongRelayError>
where
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(state.config.name_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(PongRelayError::Protocol(ProtocolError::InvalidMessage(
                "connection closed before name".into(),
            )));
        }
        Ok(Err(e)) => return Err(PongRelayError::Transport(e)),
        Err(_) => {
            return Err(PongRelayError::Protocol(ProtocolError::InvalidMessage(
                "name timed out".into(),
            )));
        }
    };

    Ok(state.auth.authenticate(&data).await?)
}

/// Sends the handshake, waits for the opponent and runs the round loop.
async fn play<A, C>(
    conn: &TcpConnection,
    state: &Arc<ServerState<A, C>>,
    handle: &MatchHandle,
    session: &mut Session,
    handshake: &Handshake,
) -> Result<(), PongRelayError>
where
    A: Authenticator,
    C: Codec,
{
    let bytes = state.codec.encode(handshake)?;
    conn.send(&bytes).await?;

    let early = match await_pairing(conn, handle).await? {
        Pairing::Ready { early } => early,
        Pairing::Abandoned => {
            tracing::info!(match_id = %session.match_id, "match abandoned before it started");
            return Ok(());
        }
        Pairing::Disconnected => {
            tracing::info!(
                match_id = %session.match_id,
                side = %session.side,
                "client left while waiting for an opponent"
            );
            return Ok(());
        }
    };

    session.activate()?;
    tracing::debug!(match_id = %session.match_id, side = %session.side, "session active");

    run_rounds(conn, state, handle, session, early).await
}

/// Blocks until the match is paired, the match ends, or the client hangs
/// up. Anything the client sends meanwhile is held back for round one.
async fn await_pairing(
    conn: &TcpConnection,
    handle: &MatchHandle,
) -> Result<Pairing, PongRelayError> {
    let mut phase = handle.subscribe();
    let mut early = None;

    loop {
        tokio::select! {
            biased;

            settled = next_phase(&mut phase, |p| *p != MatchPhase::WaitingForOpponent) => {
                let paired = settled.is_some_and(|p| p.is_active());
                return Ok(if paired {
                    Pairing::Ready { early }
                } else {
                    Pairing::Abandoned
                });
            }

            frame = conn.recv() => match frame? {
                Some(data) => {
                    if early.replace(data).is_some() {
                        tracing::debug!(match_id = %handle.match_id(), "early update superseded");
                    }
                }
                None => return Ok(Pairing::Disconnected),
            },
        }
    }
}

/// The active loop: one client update in, one authoritative state out.
async fn run_rounds<A, C>(
    conn: &TcpConnection,
    state: &Arc<ServerState<A, C>>,
    handle: &MatchHandle,
    session: &mut Session,
    mut pending: Option<Vec<u8>>,
) -> Result<(), PongRelayError>
where
    A: Authenticator,
    C: Codec,
{
    let match_id = session.match_id;
    let side = session.side;
    let mut phase = handle.subscribe();

    loop {
        let data = match pending.take() {
            Some(data) => data,
            None => tokio::select! {
                biased;

                _ = next_phase(&mut phase, MatchPhase::is_over) => {
                    tracing::debug!(%match_id, %side, phase = %handle.phase(), "match over, ending session");
                    break;
                }

                frame = tokio::time::timeout(state.config.round_timeout, conn.recv()) => match frame {
                    Ok(Ok(Some(data))) => data,
                    Ok(Ok(None)) => {
                        tracing::info!(%match_id, %side, "client disconnected");
                        break;
                    }
                    Ok(Err(e)) => {
                        tracing::debug!(%match_id, %side, error = %e, "recv error");
                        break;
                    }
                    Err(_) => {
                        tracing::info!(%match_id, %side, "client timed out");
                        break;
                    }
                },
            },
        };

        let update: ClientUpdate = match state.codec.decode(&data) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(%match_id, %side, error = %e, "malformed update, closing connection");
                break;
            }
        };
        let reported_sync = update.sync;

        let mut outcome = match handle.submit(side, update).await {
            Ok(outcome) => outcome,
            Err(MatchError::NotActive { phase, .. }) => {
                tracing::debug!(%match_id, %side, %phase, "update after match ended");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        // The actor reports a result exactly once, so it is credited before
        // the reply that might fail to send.
        let finished = outcome.finished.take();
        let decided = finished.is_some();
        if let Some(result) = finished {
            credit_win(&state.leaderboard, result).await;
        }

        let bytes = state.codec.encode(&outcome.snapshot)?;
        conn.send(&bytes).await?;
        session.record_round();
        tracing::debug!(
            %match_id,
            %side,
            reported_sync,
            sync = outcome.snapshot.sync,
            snapped = outcome.snapped,
            "round"
        );

        if decided {
            break;
        }
    }

    Ok(())
}

/// Resolves with the first phase that satisfies `done`, or `None` if the
/// match actor is gone.
async fn next_phase(
    phase: &mut watch::Receiver<MatchPhase>,
    done: impl FnMut(&MatchPhase) -> bool,
) -> Option<MatchPhase> {
    phase.wait_for(done).await.ok().map(|p| *p)
}

/// Records the winner and flushes the leaderboard. A failed flush keeps
/// the win pending for the next one.
async fn credit_win(leaderboard: &LeaderboardHandle, result: MatchResult) {
    let MatchResult {
        match_id,
        winner,
        winner_name,
        ..
    } = result;

    if let Err(e) = leaderboard.record_win(winner_name.clone()).await {
        tracing::error!(%match_id, name = %winner_name, error = %e, "failed to record win");
        return;
    }
    match leaderboard.flush().await {
        Ok(entries) => {
            tracing::info!(%match_id, %winner, name = %winner_name, entries, "win credited");
        }
        Err(e) => {
            tracing::error!(%match_id, name = %winner_name, error = %e, "leaderboard flush failed");
        }
    }
}
