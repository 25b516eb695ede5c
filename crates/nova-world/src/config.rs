//! Typed configuration sections owned by the world layer.
//!
//! These structs are embedded in the top-level `GameConfig` loaded from
//! `nova-config.yaml`. Every field has a default so a partial YAML file (or
//! none at all) yields a playable universe.

use serde::Deserialize;

/// Shape and speed of the universe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// World seed for galaxy generation and every seeded draw.
    pub seed: u64,
    /// Number of galaxies.
    pub galaxies: u32,
    /// Systems per galaxy.
    pub systems: u32,
    /// Planet positions per system.
    pub positions: u32,
    /// Probability that an unclaimed slot hosts an NPC.
    pub npc_occupancy: f64,
    /// Multiplier on production and divisor on build times.
    pub economy_speed: f64,
    /// Divisor on fleet travel times.
    pub fleet_speed: f64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            galaxies: 3,
            systems: 100,
            positions: 15,
            npc_occupancy: 0.3,
            economy_speed: 1.0,
            fleet_speed: 1.0,
        }
    }
}

/// Production and storage tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Metal per hour every planet produces regardless of mines.
    pub base_metal_per_hour: f64,
    /// Crystal per hour every planet produces regardless of mines.
    pub base_crystal_per_hour: f64,
    /// Flat metal per hour per colony.
    pub colony_metal_per_hour: f64,
    /// Flat crystal per hour per colony.
    pub colony_crystal_per_hour: f64,
    /// Flat deuterium per hour per colony.
    pub colony_deuterium_per_hour: f64,
    /// Production bonus per production-boost level.
    pub production_boost_per_level: f64,
    /// Share of storage capacity shielded from plunder.
    pub protected_fraction: f64,
    /// Starting metal for new players.
    pub starting_metal: u64,
    /// Starting crystal for new players.
    pub starting_crystal: u64,
    /// Starting deuterium for new players.
    pub starting_deuterium: u64,
    /// Message log cap per player.
    pub message_cap: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_metal_per_hour: 30.0,
            base_crystal_per_hour: 15.0,
            colony_metal_per_hour: 20.0,
            colony_crystal_per_hour: 10.0,
            colony_deuterium_per_hour: 5.0,
            production_boost_per_level: 0.1,
            protected_fraction: 0.1,
            starting_metal: 500,
            starting_crystal: 500,
            starting_deuterium: 0,
            message_cap: 200,
        }
    }
}

/// Timing of one world-event family.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventFamilyConfig {
    /// Chance per check that the event starts once the cooldown has passed.
    pub trigger_probability: f64,
    /// Quiet period after an occurrence ends, in seconds.
    pub cooldown_secs: u64,
    /// Announcement lead time before the event takes effect, in seconds.
    pub warning_secs: u64,
    /// How long the event stays in effect or on offer, in seconds.
    pub duration_secs: u64,
}

impl EventFamilyConfig {
    const fn hours(probability_pct: u32, cooldown: u64, warning: u64, duration: u64) -> Self {
        Self {
            trigger_probability: probability_pct as f64 / 100.0,
            cooldown_secs: cooldown * 3600,
            warning_secs: warning * 3600,
            duration_secs: duration * 3600,
        }
    }
}

impl Default for EventFamilyConfig {
    fn default() -> Self {
        Self::hours(10, 6, 1, 4)
    }
}

/// World-event scheduling and payloads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldEventConfig {
    /// Seconds between trigger checks.
    pub check_interval_secs: u64,
    /// Merchant visits.
    pub merchant: EventFamilyConfig,
    /// Pirate mercenary offers.
    pub pirates: EventFamilyConfig,
    /// Asteroid impacts.
    pub asteroid: EventFamilyConfig,
    /// Resource veins.
    pub vein: EventFamilyConfig,
    /// Ancient artifacts.
    pub artifact: EventFamilyConfig,
    /// Space plague.
    pub plague: EventFamilyConfig,
    /// Base merchant price per unit of metal, crystal, deuterium (credits).
    pub merchant_prices: [f64; 3],
    /// Fraction of the buy price paid when the player sells.
    pub merchant_sell_ratio: f64,
    /// Credits charged per resource unit of the offered pirate fleet's value.
    pub pirate_price_per_unit: f64,
    /// Production multiplier of an active resource vein.
    pub vein_multiplier: f64,
    /// Credits offered by an ancient artifact.
    pub artifact_credits: u64,
    /// Probability an asteroid damages a building instead of leaving ore.
    pub asteroid_damage_probability: f64,
    /// Upper bound of ore left by a harmless asteroid, per resource.
    pub asteroid_max_ore: u64,
    /// Credits paid per hour by the black market.
    pub black_market_credits_per_hour: u64,
}

impl Default for WorldEventConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 3600,
            merchant: EventFamilyConfig::hours(10, 6, 1, 4),
            pirates: EventFamilyConfig::hours(8, 8, 0, 6),
            asteroid: EventFamilyConfig::hours(5, 12, 2, 0),
            vein: EventFamilyConfig::hours(8, 8, 0, 6),
            artifact: EventFamilyConfig::hours(4, 24, 0, 12),
            plague: EventFamilyConfig::hours(4, 24, 0, 8),
            merchant_prices: [0.01, 0.02, 0.03],
            merchant_sell_ratio: 0.5,
            pirate_price_per_unit: 0.0005,
            vein_multiplier: 1.5,
            artifact_credits: 500,
            asteroid_damage_probability: 0.5,
            asteroid_max_ore: 2000,
            black_market_credits_per_hour: 10,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_keeps_defaults() {
        let universe: UniverseConfig = serde_json::from_str(r#"{"galaxies": 9}"#).unwrap();
        assert_eq!(universe.galaxies, 9);
        assert_eq!(universe.positions, 15);

        let events: WorldEventConfig =
            serde_json::from_str(r#"{"merchant": {"cooldown_secs": 60}}"#).unwrap();
        assert_eq!(events.merchant.cooldown_secs, 60);
        assert_eq!(events.check_interval_secs, 3600);
    }
}
