//! Shared type definitions for the Nova strategy game.
//!
//! This crate is the single source of truth for the state shapes that flow
//! between the catch-up engine, the store and the HTTP API. Types with a
//! player-facing shape are exported to `TypeScript` via `ts-rs` for the UI
//! layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all identifiers
//! - [`coords`] -- `galaxy:system:position` coordinates and travel distance
//! - [`enums`] -- Content families, queue kinds, mission types, outcomes
//! - [`structs`] -- Player, NPC and shared galaxy state
//! - [`messages`] -- Message log, battle/spy reports, notifications
//! - [`actions`] -- Player commands

pub mod actions;
pub mod coords;
pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::PlayerAction;
pub use coords::{CoordinateError, Coordinates};
pub use enums::{
    ArtifactChoice, BattleOutcome, BoostType, BuildingType, CombatUnit, DefenseType, EntityId,
    EventPhase, ExpeditionOutcome, ExplorationOutcome, MissionType, NotificationKind, Personality,
    QueueKind, QueueLane, Requirement, ResearchType, Resource, ShipType, TradeSide, WorldEventKind,
};
pub use ids::{BoostId, MessageId, MissionId, PlayerId};
pub use messages::{BattleReport, Message, MessageBody, Notification, SpyReport};
pub use structs::{
    ActiveBoost, AncientArtifactState, AsteroidState, BlackMarketState, Boost, BuildingLevels,
    Colony, DebrisField, Defenses, EventTimer, Fleet, FleetMission, GlobalState, HOUR_MS,
    InboundReport, MerchantState, NpcFleetMission, NpcState, PirateMercenaryState, PlanetRecord,
    PlanetSnapshot, PlayerState, QueueItem, ResearchLevels, ResourceVeinBonus, Resources,
    ShipLevels, SpacePlagueState, Timestamp, WorldEventStates, count_of, merge_counts,
    subtract_counts, unit_total,
};
