//! In-process backend used by tests and single-node deployments.
//!
//! Records live in a `HashMap` behind a [`tokio::sync::Mutex`]; a batch of
//! compare-and-swap writes checks and applies every key under one lock, so
//! it is exactly as atomic as the Lua script on `Dragonfly`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::DbError;
use crate::store::{Record, Write};

/// Shared in-memory key space. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, Record>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the record at `key`.
    pub async fn get(&self, key: &str) -> Option<Record> {
        self.records.lock().await.get(key).cloned()
    }

    /// Apply every write if all expected versions match, none otherwise.
    ///
    /// Returns the new version of each key in write order.
    pub async fn swap(&self, writes: &[Write]) -> Result<Vec<u64>, DbError> {
        let mut records = self.records.lock().await;
        for write in writes {
            let found = records.get(&write.key).map_or(0, |r| r.version);
            if found != write.expected {
                return Err(DbError::VersionConflict {
                    key: write.key.clone(),
                    expected: write.expected,
                    found,
                });
            }
        }
        Ok(writes
            .iter()
            .map(|write| {
                let version = write.expected.saturating_add(1);
                records.insert(
                    write.key.clone(),
                    Record {
                        version,
                        data: write.data.clone(),
                    },
                );
                version
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(key: &str, expected: u64, data: &str) -> Write {
        Write {
            key: key.to_owned(),
            expected,
            data: data.to_owned(),
        }
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        assert_eq!(store.swap(&[write("a", 0, "1")]).await.unwrap(), vec![1]);

        let err = store
            .swap(&[write("b", 0, "x"), write("a", 0, "2")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::VersionConflict { expected: 0, found: 1, .. }
        ));
        assert!(store.get("b").await.is_none());

        let versions = store
            .swap(&[write("b", 0, "x"), write("a", 1, "2")])
            .await
            .unwrap();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(store.get("a").await.unwrap().data, "2");
    }
}
