//! Store behaviour against both backends.
//!
//! The `Dragonfly` tests require a live service and are `#[ignore]`d:
//!
//! ```bash
//! docker compose up -d dragonfly
//! cargo test -p nova-db -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use nova_db::{DbError, StateStore};
use nova_types::{Coordinates, PlayerId, PlayerState, Resources};

const DRAGONFLY_URL: &str = "redis://localhost:6379";

fn player(n: u128) -> PlayerState {
    PlayerState::fresh(
        PlayerId::from_u128(n),
        "tester",
        Coordinates::new(1, 1, 4),
        Resources::from_units(500, 500, 0),
        0,
    )
}

async fn turn_round_trip(store: &StateStore) {
    let global = store.load_or_init_global(7).await.unwrap();
    assert_eq!(global.value.seed, 7);
    let again = store.load_or_init_global(99).await.unwrap();
    assert_eq!(again.value.seed, 7);
    assert_eq!(again.version, global.version);

    let mut state = player(1);
    let (pv, gv) = store
        .commit_turn(&state, 0, &global.value, global.version)
        .await
        .unwrap();
    assert_eq!(pv, 1);
    assert_eq!(gv, 2);

    let loaded = store.load_player(state.id).await.unwrap().unwrap();
    assert_eq!(loaded.value, state);
    assert_eq!(loaded.version, 1);

    // A writer holding the old galaxy version loses and writes nothing.
    state.last_save_time = 5_000;
    let err = store
        .commit_turn(&state, 1, &global.value, global.version)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::VersionConflict { .. }));
    let unchanged = store.load_player(state.id).await.unwrap().unwrap();
    assert_eq!(unchanged.value.last_save_time, 0);

    let (pv, _) = store.commit_turn(&state, 1, &global.value, gv).await.unwrap();
    assert_eq!(pv, 2);
}

#[tokio::test]
async fn memory_turns_are_versioned() {
    let store = StateStore::memory("nova-test");
    assert_eq!(store.backend_name(), "memory");
    assert!(store.load_global().await.unwrap().is_none());
    assert!(store.load_player(PlayerId::from_u128(1)).await.unwrap().is_none());
    turn_round_trip(&store).await;
}

#[tokio::test]
async fn new_player_cannot_overwrite_existing_one() {
    let store = StateStore::memory("nova-test");
    let global = store.load_or_init_global(1).await.unwrap();
    let state = player(2);
    let (_, gv) = store.commit_turn(&state, 0, &global.value, global.version).await.unwrap();

    let err = store.commit_turn(&state, 0, &global.value, gv).await.unwrap_err();
    assert!(matches!(err, DbError::VersionConflict { expected: 0, found: 1, .. }));
}

#[tokio::test]
async fn separate_stores_do_not_share_keys() {
    let a = StateStore::memory("a");
    let b = StateStore::memory("b");
    a.load_or_init_global(3).await.unwrap();
    assert!(b.load_global().await.unwrap().is_none());
    assert_eq!(a.global_key(), "a:global");
    assert_eq!(
        a.player_key(PlayerId::from_u128(0)),
        "a:player:00000000-0000-0000-0000-000000000000"
    );
}

#[tokio::test]
#[ignore = "requires a live Dragonfly on localhost:6379"]
async fn dragonfly_turns_are_versioned() {
    let prefix = format!("nova-test-{}", PlayerId::new());
    let store = StateStore::dragonfly(DRAGONFLY_URL, &prefix)
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?");
    assert_eq!(store.backend_name(), "dragonfly");
    turn_round_trip(&store).await;

    let raw = nova_db::dragonfly::DragonflyStore::connect(DRAGONFLY_URL).await.unwrap();
    raw.delete(&store.global_key()).await.unwrap();
    raw.delete(&store.player_key(PlayerId::from_u128(1))).await.unwrap();
}

#[tokio::test]
async fn galaxy_only_writes_are_versioned_too() {
    let store = StateStore::memory("nova-test");
    let global = store.load_or_init_global(11).await.unwrap();
    let mut changed = global.value.clone();
    changed.seed = 12;

    assert_eq!(store.commit_global(&changed, global.version).await.unwrap(), 2);
    assert!(store.commit_global(&changed, global.version).await.is_err());
    assert_eq!(store.load_global().await.unwrap().unwrap().value.seed, 12);
}
