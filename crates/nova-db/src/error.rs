//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`fred`] and [`serde_json`] errors with the key that was being touched
//! where that is known.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key was not found in the store.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A compare-and-swap write lost the race.
    #[error("Version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        /// Key that was being written.
        key: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// A stored record is malformed (missing fields, bad version number).
    #[error("Corrupt record at {key}: {reason}")]
    Corrupt {
        /// Key of the malformed record.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
