//! Player decisions, fleets, battles and NPC behaviour for Nova.
//!
//! Everything here is a synchronous function over borrowed state and a
//! [`Ruleset`]. Randomness is always passed in as a seeded generator, so the
//! same inputs give the same outcome.
//!
//! # Modules
//!
//! - [`actions`] -- The player action API: [`apply_action`].
//! - [`combat`] -- Power-ratio battle resolution, plunder and debris.
//! - [`config`] -- Combat, mission and NPC tuning sections.
//! - [`error`] -- [`ActionError`], the rejection taxonomy for commands.
//! - [`expedition`] -- Expedition and exploration outcome tables.
//! - [`mail`] -- Message log writes.
//! - [`missions`] -- Fleet dispatch, recall, arrival, exploration and return.
//! - [`npc`] -- NPC evolution cycles and NPC raids on players.
//! - [`queue`] -- Construction and shipyard lanes.
//! - [`rules`] -- [`Ruleset`], the borrowed bundle of catalog and tuning.

pub mod actions;
pub mod combat;
pub mod config;
pub mod error;
pub mod expedition;
pub mod mail;
pub mod missions;
pub mod npc;
pub mod queue;
pub mod rules;

#[cfg(test)]
mod test_support;

pub use actions::{ActionOutcome, apply_action};
pub use combat::{BattleResult, CombatSide};
pub use config::{CombatConfig, MissionConfig, NpcConfig};
pub use error::ActionError;
pub use missions::MissionStep;
pub use rules::Ruleset;
