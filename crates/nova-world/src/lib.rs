//! Game content, economy, galaxy and world events for Nova.
//!
//! This crate models everything that is not a player decision: what things
//! cost and how fast they are built, how planets produce, where NPCs live,
//! and which transient galaxy events come and go.
//!
//! # Modules
//!
//! - [`catalog`] -- The [`GameCatalog`] lookup trait and the shipped
//!   [`StandardCatalog`] tables.
//! - [`config`] -- Universe, economy and world-event configuration sections.
//! - [`error`] -- Error types for galaxy operations.
//! - [`events`] -- [`WorldEventScheduler`]: timer-driven event state machines.
//! - [`galaxy`] -- Coordinate-hash NPC occupancy, lazy NPC generation, home
//!   claiming, system views and debris fields.
//! - [`production`] -- Pure production, energy and storage model with
//!   analytic accrual.
//! - [`rng`] -- Seeded, reproducible randomness.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod galaxy;
pub mod production;
pub mod rng;

// Re-export primary types at crate root.
pub use catalog::{CombatStats, Drive, GameCatalog, ShipStats, StandardCatalog};
pub use config::{EconomyConfig, EventFamilyConfig, UniverseConfig, WorldEventConfig};
pub use error::WorldError;
pub use events::WorldEventScheduler;
pub use galaxy::{SlotOccupant, SlotView, SystemView};
pub use production::{EnergyBalance, ProductionModifiers, ProductionRates};
