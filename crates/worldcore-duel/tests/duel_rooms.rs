//! Integration tests for duel-room allocation.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use worldcore_duel::{DuelConfig, DuelError, DuelRoomManager, DuelState, SlotOutcome};
use worldcore_pool::CancellationToken;
use worldcore_protocol::{EntityId, ViewSender, ViewUpdate};

// =========================================================================
// Helpers
// =========================================================================

fn eid(id: u64) -> EntityId {
    EntityId(id)
}

fn duels(area_count: usize) -> Arc<DuelRoomManager> {
    Arc::new(DuelRoomManager::new(DuelConfig {
        area_count,
        max_score: 3,
    }))
}

// =========================================================================
// Exclusivity
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_room_concurrent_callers_get_distinct_indices() {
    const AREAS: usize = 8;
    let duels = duels(AREAS);

    let tasks: Vec<_> = (0..AREAS as u64)
        .map(|i| {
            let duels = Arc::clone(&duels);
            tokio::spawn(async move {
                let token = CancellationToken::new();
                duels
                    .create_room(eid(i * 2), eid(i * 2 + 1), &token)
                    .await
                    .unwrap()
                    .allocated()
                    .expect("a free area for every caller")
                    .index()
            })
        })
        .collect();

    let mut indices = HashSet::new();
    for task in tasks {
        assert!(indices.insert(task.await.unwrap()), "index handed out twice");
    }
    assert_eq!(indices, (0..AREAS).collect::<HashSet<_>>());

    let token = CancellationToken::new();
    let outcome = duels.create_room(eid(100), eid(101), &token).await.unwrap();
    assert!(matches!(outcome, SlotOutcome::NoSlotAvailable));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_room_oversubscribed_exactly_k_succeed() {
    const AREAS: usize = 3;
    const CALLERS: u64 = 20;
    let duels = duels(AREAS);

    let tasks: Vec<_> = (0..CALLERS)
        .map(|i| {
            let duels = Arc::clone(&duels);
            tokio::spawn(async move {
                let token = CancellationToken::new();
                duels
                    .create_room(eid(i * 2), eid(i * 2 + 1), &token)
                    .await
                    .unwrap()
                    .is_allocated()
            })
        })
        .collect();

    let mut allocated = 0;
    for task in tasks {
        if task.await.unwrap() {
            allocated += 1;
        }
    }
    assert_eq!(allocated, AREAS);
    assert_eq!(duels.active_room_count(), AREAS);
}

#[tokio::test]
async fn test_release_then_exactly_one_reuse() {
    let duels = duels(2);
    let token = CancellationToken::new();
    let first = duels
        .create_room(eid(1), eid(2), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();
    let _second = duels
        .create_room(eid(3), eid(4), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();

    duels.release(&first);

    let reused = duels
        .create_room(eid(5), eid(6), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();
    assert_eq!(reused.index(), first.index());
    let outcome = duels.create_room(eid(7), eid(8), &token).await.unwrap();
    assert!(matches!(outcome, SlotOutcome::NoSlotAvailable));
}

#[tokio::test]
#[should_panic(expected = "released but not held")]
async fn test_release_twice_panics() {
    let duels = duels(1);
    let token = CancellationToken::new();
    let room = duels
        .create_room(eid(1), eid(2), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();

    duels.release(&room);
    duels.release(&room);
}

#[tokio::test]
async fn test_release_stale_room_after_reuse_panics_without_freeing() {
    let duels = duels(1);
    let token = CancellationToken::new();
    let stale = duels
        .create_room(eid(1), eid(2), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();
    duels.release(&stale);
    let _current = duels
        .create_room(eid(3), eid(4), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| duels.release(&stale)));

    assert!(result.is_err());
    assert_eq!(duels.room(0).unwrap().participants(), (eid(3), eid(4)));
}

// =========================================================================
// Cancellation and lookup
// =========================================================================

#[tokio::test]
async fn test_create_room_cancelled_token_claims_nothing() {
    let duels = duels(2);
    let token = CancellationToken::new();
    token.cancel();

    let outcome = duels.create_room(eid(1), eid(2), &token).await.unwrap();

    assert!(matches!(outcome, SlotOutcome::Cancelled));
    assert_eq!(duels.active_room_count(), 0);
}

#[tokio::test]
async fn test_room_out_of_range_is_none() {
    let duels = duels(2);
    assert!(duels.room(0).is_none());
    assert!(duels.room(2).is_none());
    assert!(duels.room(usize::MAX).is_none());
    assert_eq!(duels.max_room_count(), 2);
}

#[tokio::test]
async fn test_create_room_rejects_busy_participant() {
    let duels = duels(4);
    let token = CancellationToken::new();
    duels.create_room(eid(1), eid(2), &token).await.unwrap();

    let err = duels.create_room(eid(1), eid(9), &token).await.unwrap_err();

    assert!(matches!(err, DuelError::AlreadyInDuel(p, 0) if p == eid(1)));
}

// =========================================================================
// Duel lifecycle
// =========================================================================

#[tokio::test]
async fn test_duel_full_lifecycle() {
    let duels = duels(1);
    let token = CancellationToken::new();
    let room = duels
        .create_room(eid(10), eid(20), &token)
        .await
        .unwrap()
        .allocated()
        .unwrap();

    room.start().unwrap();
    assert_eq!(room.state(), DuelState::InProgress);
    for _ in 0..2 {
        assert_eq!(room.record_score(eid(10)).unwrap(), None);
    }
    assert_eq!(room.record_score(eid(10)).unwrap(), Some(eid(10)));
    assert_eq!(room.state(), DuelState::Finished);

    duels.release(&room);
    assert_eq!(duels.active_room_count(), 0);
}

// =========================================================================
// Occupancy broadcast
// =========================================================================

#[tokio::test]
async fn test_broadcast_occupancy_pushes_state() {
    let duels = duels(2);
    let token = CancellationToken::new();
    duels.create_room(eid(1), eid(2), &token).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink: ViewSender = tx;

    duels.broadcast_occupancy(&sink);

    let Some(ViewUpdate::DuelOccupancy(slots)) = rx.recv().await else {
        panic!("expected a duel occupancy update");
    };
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].participants, Some((eid(1), eid(2))));
    assert_eq!(slots[1].participants, None);
}
