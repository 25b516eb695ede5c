//! Typed, versioned access to player and galaxy blobs.
//!
//! ## Turn flow
//!
//! 1. [`StateStore::load_global`] and [`StateStore::load_player`] return the
//!    value together with the version it was read at.
//! 2. The caller advances and mutates both in memory.
//! 3. [`StateStore::commit_turn`] writes both blobs if and only if neither
//!    version moved; otherwise it returns [`DbError::VersionConflict`] and
//!    the caller starts over from fresh reads.

use nova_types::{GlobalState, PlayerId, PlayerState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::dragonfly::DragonflyStore;
use crate::error::DbError;
use crate::memory::MemoryStore;

/// A raw stored blob. Version 0 means the key has never been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Monotonic write counter.
    pub version: u64,
    /// JSON payload.
    pub data: String,
}

/// One key of a compare-and-swap batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    /// Full key including the prefix.
    pub key: String,
    /// Version the writer read (0 for a new key).
    pub expected: u64,
    /// New JSON payload.
    pub data: String,
}

/// A value read from the store with its version stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// The decoded value.
    pub value: T,
    /// Version to pass back on write.
    pub version: u64,
}

#[derive(Clone)]
enum Backend {
    Memory(MemoryStore),
    Dragonfly(DragonflyStore),
}

/// Player and galaxy state store.
#[derive(Clone)]
pub struct StateStore {
    backend: Backend,
    prefix: String,
}

impl StateStore {
    /// An empty in-process store.
    pub fn memory(prefix: &str) -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
            prefix: prefix.to_owned(),
        }
    }

    /// Connect to `Dragonfly` at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the URL is invalid or the connection fails.
    pub async fn dragonfly(url: &str, prefix: &str) -> Result<Self, DbError> {
        Ok(Self {
            backend: Backend::Dragonfly(DragonflyStore::connect(url).await?),
            prefix: prefix.to_owned(),
        })
    }

    /// Short backend name for logs and health output.
    pub const fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Dragonfly(_) => "dragonfly",
        }
    }

    /// Key of the shared galaxy blob.
    pub fn global_key(&self) -> String {
        format!("{}:global", self.prefix)
    }

    /// Key of one player's blob.
    pub fn player_key(&self, id: PlayerId) -> String {
        format!("{}:player:{id}", self.prefix)
    }

    // =========================================================================
    // Typed reads
    // =========================================================================

    /// Load a player's state.
    pub async fn load_player(
        &self,
        id: PlayerId,
    ) -> Result<Option<Versioned<PlayerState>>, DbError> {
        self.load(&self.player_key(id)).await
    }

    /// Load the galaxy state, if it has been initialised.
    pub async fn load_global(&self) -> Result<Option<Versioned<GlobalState>>, DbError> {
        self.load(&self.global_key()).await
    }

    /// Load the galaxy state, creating an empty galaxy for `seed` on first use.
    ///
    /// Two callers racing to initialise both end up with the winner's blob.
    pub async fn load_or_init_global(&self, seed: u64) -> Result<Versioned<GlobalState>, DbError> {
        if let Some(global) = self.load_global().await? {
            return Ok(global);
        }
        let fresh = GlobalState::new(seed);
        let write = encode(self.global_key(), 0, &fresh)?;
        match self.swap(&[write]).await {
            Ok(_) => {
                debug!(seed, "galaxy initialised");
                Ok(Versioned {
                    value: fresh,
                    version: 1,
                })
            }
            Err(DbError::VersionConflict { .. }) => self
                .load_global()
                .await?
                .ok_or_else(|| DbError::KeyNotFound(self.global_key())),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Typed writes
    // =========================================================================

    /// Write a player and the galaxy together.
    ///
    /// Both writes happen only if both stored versions still equal the ones
    /// given. Returns the new `(player, global)` versions.
    pub async fn commit_turn(
        &self,
        player: &PlayerState,
        player_version: u64,
        global: &GlobalState,
        global_version: u64,
    ) -> Result<(u64, u64), DbError> {
        let writes = [
            encode(self.player_key(player.id), player_version, player)?,
            encode(self.global_key(), global_version, global)?,
        ];
        match self.swap(&writes).await?.as_slice() {
            [p, g] => Ok((*p, *g)),
            other => Err(DbError::Corrupt {
                key: self.global_key(),
                reason: format!("expected two versions, got {}", other.len()),
            }),
        }
    }

    /// Write the galaxy alone, for reads that materialise NPCs.
    pub async fn commit_global(&self, global: &GlobalState, version: u64) -> Result<u64, DbError> {
        let write = encode(self.global_key(), version, global)?;
        self.swap(&[write])
            .await?
            .first()
            .copied()
            .ok_or_else(|| DbError::KeyNotFound(self.global_key()))
    }

    // =========================================================================
    // Raw access
    // =========================================================================

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Versioned<T>>, DbError> {
        let record = match &self.backend {
            Backend::Memory(m) => m.get(key).await,
            Backend::Dragonfly(d) => d.get(key).await?,
        };
        record
            .map(|r| {
                Ok(Versioned {
                    value: serde_json::from_str(&r.data)?,
                    version: r.version,
                })
            })
            .transpose()
    }

    async fn swap(&self, writes: &[Write]) -> Result<Vec<u64>, DbError> {
        match &self.backend {
            Backend::Memory(m) => m.swap(writes).await,
            Backend::Dragonfly(d) => d.swap(writes).await,
        }
    }
}

fn encode<T: Serialize>(key: String, expected: u64, value: &T) -> Result<Write, DbError> {
    Ok(Write {
        key,
        expected,
        data: serde_json::to_string(value)?,
    })
}
