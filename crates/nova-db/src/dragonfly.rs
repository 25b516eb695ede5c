//! `Dragonfly` (Redis-compatible) backend.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{prefix}:global` | Hash | Shared galaxy state |
//! | `{prefix}:player:{id}` | Hash | One player's full state |
//!
//! Every hash carries two fields: `version` (integer, absent means 0) and
//! `data` (the JSON blob). Writes go through [`SWAP_SCRIPT`], which checks
//! every expected version before touching any key.

use std::collections::HashMap;

use fred::prelude::*;

use crate::error::DbError;
use crate::store::{Record, Write};

/// Multi-key compare-and-swap.
///
/// `ARGV` holds `(expected, data)` pairs in `KEYS` order. Returns
/// `{1, v1, v2, ...}` on success or `{0, index, found}` for the first key
/// whose version did not match.
pub const SWAP_SCRIPT: &str = r"
for i, key in ipairs(KEYS) do
  local found = tonumber(redis.call('HGET', key, 'version') or '0')
  if found ~= tonumber(ARGV[2 * i - 1]) then
    return {0, i, found}
  end
end
local out = {1}
for i, key in ipairs(KEYS) do
  local next = tonumber(ARGV[2 * i - 1]) + 1
  redis.call('HSET', key, 'version', next, 'data', ARGV[2 * i])
  out[#out + 1] = next
end
return out
";

/// Connection handle to a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Read the record at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Corrupt`] if the hash lacks `data` or carries a
    /// non-numeric `version`.
    pub async fn get(&self, key: &str) -> Result<Option<Record>, DbError> {
        let mut fields: HashMap<String, String> = self.client.hgetall(key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        let corrupt = |reason: &str| DbError::Corrupt {
            key: key.to_owned(),
            reason: reason.to_owned(),
        };
        let version = fields
            .get("version")
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| corrupt("missing or invalid version"))?;
        let data = fields.remove("data").ok_or_else(|| corrupt("missing data"))?;
        Ok(Some(Record { version, data }))
    }

    /// Apply every write if all expected versions match, none otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::VersionConflict`] naming the first stale key.
    pub async fn swap(&self, writes: &[Write]) -> Result<Vec<u64>, DbError> {
        let keys: Vec<String> = writes.iter().map(|w| w.key.clone()).collect();
        let args: Vec<String> = writes
            .iter()
            .flat_map(|w| [w.expected.to_string(), w.data.clone()])
            .collect();
        let reply: Vec<i64> = self.client.eval(SWAP_SCRIPT, keys, args).await?;

        match reply.split_first() {
            Some((1, versions)) => versions
                .iter()
                .map(|v| {
                    u64::try_from(*v).map_err(|e| DbError::Corrupt {
                        key: "swap reply".to_owned(),
                        reason: e.to_string(),
                    })
                })
                .collect(),
            Some((0, [index, found])) => {
                let write = usize::try_from(*index)
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| writes.get(i));
                Err(DbError::VersionConflict {
                    key: write.map(|w| w.key.clone()).unwrap_or_default(),
                    expected: write.map_or(0, |w| w.expected),
                    found: u64::try_from(*found).unwrap_or(0),
                })
            }
            _ => Err(DbError::Corrupt {
                key: "swap reply".to_owned(),
                reason: format!("unexpected script reply {reply:?}"),
            }),
        }
    }

    /// Delete a key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }
}
