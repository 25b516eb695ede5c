//! Typed configuration sections for combat, missions and NPC behaviour.
//!
//! Like the world sections, each struct deserializes with
//! `#[serde(default)]` so that any subset of fields may be given.

use serde::Deserialize;

/// Battle tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Stat bonus per weapons/shielding/armour level.
    pub tech_bonus_per_level: f64,
    /// Stat bonus per ship upgrade tier.
    pub upgrade_bonus_per_level: f64,
    /// Attack penalty on plague-infected ship types.
    pub plague_attack_penalty: f64,
    /// Attack bonus per combat-boost level.
    pub combat_boost_per_level: f64,
    /// Share of the defender's unprotected resources a winner carries off.
    pub loot_fraction: f64,
    /// Share of destroyed units' metal and crystal cost left as debris.
    pub debris_recovery_rate: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tech_bonus_per_level: 0.1,
            upgrade_bonus_per_level: 0.1,
            plague_attack_penalty: 0.2,
            combat_boost_per_level: 0.1,
            loot_fraction: 0.5,
            debris_recovery_rate: 0.3,
        }
    }
}

/// Fleet mission tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Fixed part of every flight, in seconds.
    pub base_flight_secs: f64,
    /// Distance at which a ship burns its nominal fuel.
    pub fuel_reference_distance: f64,
    /// How long an exploration fleet holds at the target, in seconds.
    pub exploration_hold_secs: u64,
    /// Expedition outcome weights, in `ExpeditionOutcome::ALL` order.
    pub expedition_weights: [u32; 8],
    /// Exploration outcome weights, in `ExplorationOutcome::ALL` order.
    pub exploration_weights: [u32; 5],
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            base_flight_secs: 10.0,
            fuel_reference_distance: 35_000.0,
            exploration_hold_secs: 3600,
            expedition_weights: [30, 10, 10, 25, 8, 5, 9, 3],
            exploration_weights: [20, 15, 30, 15, 20],
        }
    }
}

/// NPC evolution tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Length of one evolution cycle, in seconds.
    pub cycle_secs: u64,
    /// Full cycles simulated per catch-up; older backlog only accrues.
    pub max_cycles_per_catch_up: u32,
    /// Greedy build attempts per cycle.
    pub build_iterations: u32,
    /// Minimum combat power before an aggressive NPC launches missions.
    pub attack_power_threshold: f64,
    /// Chance per cycle of an attack launch.
    pub attack_probability: f64,
    /// Chance per cycle of a spy launch.
    pub spy_probability: f64,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            cycle_secs: 3600,
            max_cycles_per_catch_up: 48,
            build_iterations: 5,
            attack_power_threshold: 5000.0,
            attack_probability: 0.05,
            spy_probability: 0.05,
        }
    }
}
