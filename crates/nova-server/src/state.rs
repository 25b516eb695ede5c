//! Shared application state for the player API.
//!
//! [`AppState`] carries the loaded configuration, the state store, the
//! game clock and one async mutex per player. The per-player lock keeps two
//! requests for the same player from racing inside this process; the
//! store's compare-and-swap covers everything else.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nova_agents::Ruleset;
use nova_core::GameConfig;
use nova_db::StateStore;
use nova_types::{PlayerId, Timestamp};
use nova_world::StandardCatalog;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Source of "now" for every request.
#[derive(Debug, Clone)]
pub enum Clock {
    /// Wall-clock milliseconds since the Unix epoch.
    System,
    /// A settable instant, for tests and replays.
    Fixed(Arc<AtomicU64>),
}

impl Clock {
    /// A fixed clock starting at `at`.
    pub fn fixed(at: Timestamp) -> Self {
        Self::Fixed(Arc::new(AtomicU64::new(at)))
    }

    /// Current game time.
    pub fn now(&self) -> Timestamp {
        match self {
            Self::System => u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0),
            Self::Fixed(at) => at.load(Ordering::SeqCst),
        }
    }

    /// Move a fixed clock to `at`. No-op on the system clock.
    pub fn set(&self, at: Timestamp) {
        if let Self::Fixed(cell) = self {
            cell.store(at, Ordering::SeqCst);
        }
    }
}

/// One lazily created mutex per player. Entries are dropped again once a
/// turn finishes and nobody else is waiting.
#[derive(Debug, Default)]
pub struct PlayerLocks {
    locks: Mutex<HashMap<PlayerId, Arc<Mutex<()>>>>,
}

impl PlayerLocks {
    /// Wait for exclusive access to `id`'s turn.
    pub async fn acquire(&self, id: PlayerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Forget `id`'s lock if no request holds it or waits on it.
    pub async fn release(&self, id: PlayerId) {
        let mut locks = self.locks.lock().await;
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }

    /// Run `turn` holding `id`'s lock, then release the entry.
    pub async fn run<F: Future>(&self, id: PlayerId, turn: F) -> F::Output {
        let guard = self.acquire(id).await;
        let out = turn.await;
        drop(guard);
        self.release(id).await;
        out
    }

    /// Number of players with a live lock entry.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Game tuning and infrastructure settings.
    pub config: Arc<GameConfig>,
    /// Versioned player and galaxy blobs.
    pub store: StateStore,
    /// Game time source.
    pub clock: Clock,
    /// Per-player request serialization.
    pub locks: Arc<PlayerLocks>,
}

impl AppState {
    /// Build application state around an existing store.
    pub fn new(config: GameConfig, store: StateStore, clock: Clock) -> Self {
        Self {
            config: Arc::new(config),
            store,
            clock,
            locks: Arc::new(PlayerLocks::default()),
        }
    }

    /// The game rules with the shipped content tables.
    pub fn rules(&self) -> Ruleset<'_> {
        self.config.ruleset(&StandardCatalog)
    }
}
