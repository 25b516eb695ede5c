//! Player API server for Nova.
//!
//! An Axum HTTP server over a [`nova_db::StateStore`]. Each request for a
//! player is one turn: the player's world is advanced to the current time,
//! at most one action is applied, and the player and galaxy blobs are
//! written back together.
//!
//! # Modules
//!
//! - [`router`] -- Route table, CORS and request tracing
//! - [`handlers`] -- Path and body parsing
//! - [`turn`] -- Read, advance, act, compare-and-swap write
//! - [`state`] -- [`AppState`], the game clock and per-player locks
//! - [`server`] -- Bind and serve
//! - [`startup`] -- Logging and store setup for the binary
//! - [`error`] -- [`ApiError`] and its HTTP mapping

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod turn;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::{AppState, Clock};
