//! Offline catch-up, player creation and configuration for Nova.
//!
//! A player's world only moves when the player is looked at. Every request
//! first calls [`advance`] to resolve everything that happened since the
//! last save, then applies at most one player action on top.
//!
//! # Modules
//!
//! - [`advance`] -- The event-driven sweep from `last_save_time` to `now`.
//! - [`config`] -- `nova-config.yaml` loading into [`GameConfig`].
//! - [`conservation`] -- Ship total checks across snapshots.
//! - [`player`] -- [`new_player`]: home claiming and starting state.

pub mod advance;
pub mod config;
pub mod conservation;
pub mod player;

pub use advance::{Advanced, advance, publish_home};
pub use config::{ConfigError, GameConfig, LoggingConfig, ServerConfig, StoreBackend, StoreConfig};
pub use conservation::{ConservationResult, verify_fleet_conservation};
pub use player::new_player;
