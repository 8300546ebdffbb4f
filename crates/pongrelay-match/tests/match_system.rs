//! Integration tests for the registry and match actors.

use std::time::Duration;

use pongrelay_match::{MatchConfig, MatchError, MatchPhase, MatchRegistry};
use pongrelay_protocol::{ClientUpdate, MatchId, PlayerName, Score, Side, Vector2};

// =========================================================================
// Helpers
// =========================================================================

fn name(s: &str) -> PlayerName {
    PlayerName::new(s)
}

fn update(sync: u64, paddle: (f64, f64), ball: (f64, f64), score: (u32, u32)) -> ClientUpdate {
    ClientUpdate {
        sync,
        paddle: Vector2::new(paddle.0, paddle.1),
        ball: Vector2::new(ball.0, ball.1),
        score: Score::new(score.0, score.1),
    }
}

/// Waits until the registry has torn `match_id` down.
async fn wait_until_removed(registry: &MatchRegistry, match_id: MatchId) {
    for _ in 0..50 {
        if !registry.match_ids().contains(&match_id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("match {match_id} was never removed");
}

// =========================================================================
// Slot assignment
// =========================================================================

#[tokio::test]
async fn test_first_two_connections_share_a_match() {
    let mut registry = MatchRegistry::default();

    let a = registry.assign(name("alice")).await.unwrap();
    assert_eq!(a.side, Side::Left);
    assert_eq!(a.match_id, MatchId(1));
    assert_eq!(registry.pending(), Some(MatchId(1)));

    let b = registry.assign(name("bob")).await.unwrap();
    assert_eq!(b.side, Side::Right);
    assert_eq!(b.match_id, a.match_id);
    assert_eq!(registry.pending(), None);
    assert_eq!(registry.match_count(), 1);
}

#[tokio::test]
async fn test_third_connection_opens_new_match() {
    let mut registry = MatchRegistry::default();
    registry.assign(name("a")).await.unwrap();
    registry.assign(name("b")).await.unwrap();

    let c = registry.assign(name("c")).await.unwrap();
    assert_eq!(c.side, Side::Left);
    assert_eq!(c.match_id, MatchId(2));
    assert_eq!(registry.match_count(), 2);
}

#[tokio::test]
async fn test_registry_lists_and_describes_matches() {
    let mut registry = MatchRegistry::default();
    registry.assign(name("a")).await.unwrap();
    registry.assign(name("b")).await.unwrap();
    registry.assign(name("c")).await.unwrap();

    let mut ids = registry.match_ids();
    ids.sort();
    assert_eq!(ids, vec![MatchId(1), MatchId(2)]);

    let info = registry.match_info(MatchId(2)).await.unwrap();
    assert_eq!(info.phase, MatchPhase::WaitingForOpponent);
    assert_eq!(info.slot(Side::Left).unwrap().player_name, name("c"));

    let err = registry.match_info(MatchId(9)).await.unwrap_err();
    assert!(matches!(err, MatchError::NotFound(MatchId(9))));
}

#[tokio::test]
async fn test_pairing_flips_ready_and_phase() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();

    assert_eq!(a.handle.phase(), MatchPhase::WaitingForOpponent);
    let info = a.handle.info().await.unwrap();
    assert!(!info.slot(Side::Left).unwrap().ready);
    assert!(info.slot(Side::Right).is_none());
    assert!(!info.state.active);

    let mut phase = a.handle.subscribe();
    registry.assign(name("bob")).await.unwrap();

    let paired = tokio::time::timeout(
        Duration::from_secs(1),
        phase.wait_for(|p| p.is_active()),
    )
    .await
    .expect("pairing should be signalled")
    .expect("actor alive");
    assert_eq!(*paired, MatchPhase::InProgress);
    drop(paired);

    let info = a.handle.info().await.unwrap();
    assert!(info.slot(Side::Left).unwrap().ready);
    assert!(info.slot(Side::Right).unwrap().ready);
    assert_eq!(info.slot(Side::Right).unwrap().player_name, name("bob"));
    assert!(info.state.active);
}

#[tokio::test]
async fn test_updates_rejected_before_pairing() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();

    let err = a
        .handle
        .submit(Side::Left, update(0, (10.0, 10.0), (0.0, 0.0), (0, 0)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MatchError::NotActive {
            phase: MatchPhase::WaitingForOpponent,
            ..
        }
    ));
}

// =========================================================================
// Abandonment
// =========================================================================

#[tokio::test]
async fn test_left_leaving_before_pairing_destroys_match() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();

    registry.leave(a.match_id, Side::Left).await.unwrap();
    assert_eq!(registry.pending(), None);
    assert_eq!(registry.match_count(), 0);

    // The next player starts fresh rather than joining the dead match.
    let b = registry.assign(name("bob")).await.unwrap();
    assert_eq!(b.side, Side::Left);
    assert_ne!(b.match_id, a.match_id);
}

#[tokio::test]
async fn test_leave_mid_match_abandons_and_signals_peer() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();
    let mut peer_phase = b.handle.subscribe();

    registry.leave(a.match_id, Side::Left).await.unwrap();

    let phase = tokio::time::timeout(
        Duration::from_secs(1),
        peer_phase.wait_for(|p| p.is_over()),
    )
    .await
    .expect("peer should see the match end")
    .expect("actor alive");
    assert_eq!(*phase, MatchPhase::Abandoned);
    drop(phase);

    // Match stays registered until the right side lets go too.
    assert_eq!(registry.match_count(), 1);
    let err = b
        .handle
        .submit(Side::Right, update(1, (620.0, 0.0), (0.0, 0.0), (0, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::NotActive { phase: MatchPhase::Abandoned, .. }));

    registry.leave(b.match_id, Side::Right).await.unwrap();
    wait_until_removed(&registry, b.match_id).await;
    assert_eq!(registry.match_count(), 0);
}

#[tokio::test]
async fn test_leave_unknown_match_is_not_found() {
    let mut registry = MatchRegistry::default();
    let err = registry.leave(MatchId(42), Side::Left).await.unwrap_err();
    assert!(matches!(err, MatchError::NotFound(MatchId(42))));
}

// =========================================================================
// Rounds
// =========================================================================

#[tokio::test]
async fn test_first_round_echoes_both_paddles() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();

    let left = a
        .handle
        .submit(Side::Left, update(0, (10.0, 100.0), (320.0, 240.0), (0, 0)))
        .await
        .unwrap();
    assert_eq!(left.snapshot.sync, 0);
    assert_eq!(left.snapshot.left, Vector2::new(10.0, 100.0));

    let right = b
        .handle
        .submit(Side::Right, update(0, (620.0, 300.0), (1.0, 1.0), (0, 0)))
        .await
        .unwrap();
    assert_eq!(right.snapshot.sync, 0);
    assert_eq!(right.snapshot.left, Vector2::new(10.0, 100.0));
    assert_eq!(right.snapshot.right, Vector2::new(620.0, 300.0));
    assert_eq!(right.snapshot.ball, Vector2::new(320.0, 240.0), "right never writes the ball");
    assert!(!right.snapped);
}

#[tokio::test]
async fn test_lagging_side_is_snapped() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();

    let ahead = a
        .handle
        .submit(Side::Left, update(10, (10.0, 50.0), (200.0, 200.0), (1, 0)))
        .await
        .unwrap();

    let behind = b
        .handle
        .submit(Side::Right, update(5, (620.0, 400.0), (0.0, 0.0), (0, 0)))
        .await
        .unwrap();
    assert!(behind.snapped);
    assert_eq!(behind.snapshot, ahead.snapshot);

    // Having adopted sync 10, the right side's next report merges.
    let caught_up = b
        .handle
        .submit(Side::Right, update(11, (620.0, 400.0), (0.0, 0.0), (1, 0)))
        .await
        .unwrap();
    assert!(!caught_up.snapped);
    assert_eq!(caught_up.snapshot.right, Vector2::new(620.0, 400.0));
    assert_eq!(caught_up.snapshot.sync, 11);
}

#[tokio::test]
async fn test_concurrent_rounds_are_serialized() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();

    let left = tokio::spawn({
        let handle = a.handle.clone();
        async move {
            for sync in 0..200u64 {
                let _ = handle
                    .submit(Side::Left, update(sync, (10.0, sync as f64), (sync as f64, 0.0), (0, 0)))
                    .await;
            }
        }
    });
    let right = tokio::spawn({
        let handle = b.handle.clone();
        async move {
            for sync in 0..200u64 {
                let _ = handle
                    .submit(Side::Right, update(sync, (620.0, sync as f64), (0.0, 0.0), (0, 0)))
                    .await;
            }
        }
    });
    left.await.unwrap();
    right.await.unwrap();

    let info = a.handle.info().await.unwrap();
    assert_eq!(info.state.sync, 199);
    assert_eq!(info.state.left_paddle.x, 10.0);
    assert_eq!(info.state.right_paddle.x, 620.0);
}

// =========================================================================
// Completion
// =========================================================================

#[tokio::test]
async fn test_reaching_win_score_finishes_once() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();

    let mid = a
        .handle
        .submit(Side::Left, update(1, (10.0, 0.0), (0.0, 0.0), (4, 2)))
        .await
        .unwrap();
    assert!(mid.finished.is_none());

    let last = a
        .handle
        .submit(Side::Left, update(2, (10.0, 0.0), (0.0, 0.0), (5, 2)))
        .await
        .unwrap();
    let result = last.finished.expect("match should finish");
    assert_eq!(result.winner, Side::Left);
    assert_eq!(result.winner_name, name("alice"));
    assert_eq!(result.score, Score::new(5, 2));
    assert_eq!(a.handle.phase(), MatchPhase::Finished { winner: Side::Left });

    // The other side's next round is refused; no second result.
    let err = b
        .handle
        .submit(Side::Right, update(3, (620.0, 0.0), (0.0, 0.0), (5, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::NotActive { .. }));

    let info = a.handle.info().await.unwrap();
    assert!(!info.state.active);
}

#[tokio::test]
async fn test_right_player_can_win() {
    let mut registry = MatchRegistry::new(MatchConfig {
        win_score: 3,
        ..MatchConfig::default()
    });
    registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();

    let out = b
        .handle
        .submit(Side::Right, update(1, (620.0, 0.0), (0.0, 0.0), (1, 3)))
        .await
        .unwrap();
    let result = out.finished.expect("finished");
    assert_eq!(result.winner, Side::Right);
    assert_eq!(result.winner_name, name("bob"));
}

#[tokio::test]
async fn test_finished_match_stays_finished_after_leave() {
    let mut registry = MatchRegistry::default();
    let a = registry.assign(name("alice")).await.unwrap();
    let b = registry.assign(name("bob")).await.unwrap();

    a.handle
        .submit(Side::Left, update(1, (10.0, 0.0), (0.0, 0.0), (0, 5)))
        .await
        .unwrap();
    registry.leave(a.match_id, Side::Left).await.unwrap();

    assert_eq!(b.handle.phase(), MatchPhase::Finished { winner: Side::Right });
}
