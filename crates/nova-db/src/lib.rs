//! Persistence for Nova: versioned player and galaxy blobs.
//!
//! Each player's state and the shared galaxy state are stored as JSON blobs
//! with a version stamp. A turn reads both, advances them in memory and
//! writes them back in one compare-and-swap batch, so two requests that
//! race on the same galaxy never silently overwrite each other.
//!
//! # Modules
//!
//! - [`store`] -- [`StateStore`]: typed reads and batched CAS writes
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend and Lua script
//! - [`memory`] -- In-process backend
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod memory;
pub mod store;

pub use error::DbError;
pub use store::{StateStore, Versioned};
