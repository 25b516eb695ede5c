//! Resource and energy throughput.
//!
//! Production is a pure function of building levels and modifiers. Callers
//! apply the hourly rate over an elapsed interval with [`accrue`], which is
//! exact for any interval length because the rate is constant between
//! events and accrual is clamped to storage capacity.
//!
//! # Rate formula
//!
//! ```text
//! efficiency = produced >= consumed ? 1 : max(0, produced / consumed)
//! mine_rate  = base(level) * efficiency * vein * (1 + boost) + colony_bonus
//! ```
//!
//! A flat planet income (metal and crystal) is added on top, unscaled.

use nova_types::{
    BoostType, BuildingLevels, BuildingType, NpcState, PlayerState, Resource, ResearchType,
    Resources, ResourceVeinBonus, Timestamp, count_of,
};
use rust_decimal::Decimal;

use crate::catalog::{GameCatalog, to_decimal};
use crate::config::EconomyConfig;

/// Energy supply and demand of a planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBalance {
    /// Energy produced.
    pub produced: f64,
    /// Energy consumed.
    pub consumed: f64,
    /// Fraction of nominal mine output achieved.
    pub efficiency: f64,
}

/// Hourly throughput of a planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionRates {
    /// Resources per hour.
    pub per_hour: Resources,
    /// Energy balance behind the rates.
    pub energy: EnergyBalance,
}

/// Modifiers applied on top of building levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionModifiers<'a> {
    /// Active resource vein, if any.
    pub vein: Option<&'a ResourceVeinBonus>,
    /// Number of founded colonies.
    pub colonies: u32,
    /// Level of the active production boost.
    pub boost_level: u32,
    /// Energy technology level.
    pub energy_tech: u32,
}

/// Compute hourly production from building levels and modifiers.
pub fn production_rates(
    catalog: &dyn GameCatalog,
    economy: &EconomyConfig,
    speed: f64,
    buildings: &BuildingLevels,
    modifiers: &ProductionModifiers<'_>,
) -> ProductionRates {
    let mut produced = 0.0;
    let mut consumed = 0.0;
    for building in BuildingType::ALL {
        let level = count_of(buildings, &building);
        produced += catalog.energy_production(building, level, modifiers.energy_tech);
        consumed += catalog.energy_consumption(building, level);
    }
    let efficiency = if produced >= consumed {
        1.0
    } else if consumed > 0.0 {
        (produced / consumed).max(0.0)
    } else {
        1.0
    };

    let boost = f64::from(modifiers.boost_level).mul_add(economy.production_boost_per_level, 1.0);
    let colonies = f64::from(modifiers.colonies);

    let mine_rate = |building: BuildingType, resource: Resource, colony_bonus: f64| -> f64 {
        let base = catalog.base_production(building, count_of(buildings, &building));
        let vein = modifiers
            .vein
            .filter(|v| v.resource == Some(resource))
            .map_or(1.0, |v| v.multiplier);
        (base * efficiency * vein * boost).mul_add(speed, colony_bonus * colonies)
    };

    let metal = mine_rate(
        BuildingType::MetalMine,
        Resource::Metal,
        economy.colony_metal_per_hour,
    ) + economy.base_metal_per_hour * speed;
    let crystal = mine_rate(
        BuildingType::CrystalMine,
        Resource::Crystal,
        economy.colony_crystal_per_hour,
    ) + economy.base_crystal_per_hour * speed;
    let deuterium = mine_rate(
        BuildingType::DeuteriumSynthesizer,
        Resource::Deuterium,
        economy.colony_deuterium_per_hour,
    );

    ProductionRates {
        per_hour: Resources::new(to_decimal(metal), to_decimal(crystal), to_decimal(deuterium)),
        energy: EnergyBalance {
            produced,
            consumed,
            efficiency,
        },
    }
}

/// Hourly production of a player's home planet.
pub fn player_rates(
    catalog: &dyn GameCatalog,
    economy: &EconomyConfig,
    speed: f64,
    player: &PlayerState,
) -> ProductionRates {
    let vein = &player.events.vein;
    let modifiers = ProductionModifiers {
        vein: vein.resource.is_some().then_some(vein),
        colonies: u32::try_from(player.colonies.len()).unwrap_or(u32::MAX),
        boost_level: player.boost_level(BoostType::Production),
        energy_tech: player.research_level(ResearchType::EnergyTechnology),
    };
    production_rates(catalog, economy, speed, &player.buildings, &modifiers)
}

/// Hourly production of an NPC planet.
pub fn npc_rates(
    catalog: &dyn GameCatalog,
    economy: &EconomyConfig,
    speed: f64,
    npc: &NpcState,
) -> ProductionRates {
    let modifiers = ProductionModifiers {
        energy_tech: count_of(&npc.research, &ResearchType::EnergyTechnology),
        ..ProductionModifiers::default()
    };
    production_rates(catalog, economy, speed, &npc.buildings, &modifiers)
}

/// Storage capacity per resource.
pub fn capacity(catalog: &dyn GameCatalog, buildings: &BuildingLevels) -> Resources {
    let cap = |building: BuildingType| {
        to_decimal(catalog.storage_capacity(count_of(buildings, &building)))
    };
    Resources::new(
        cap(BuildingType::MetalStorage),
        cap(BuildingType::CrystalStorage),
        cap(BuildingType::DeuteriumTank),
    )
}

/// Resources after producing at `rates` for `elapsed_ms`, clamped to `cap`.
pub fn accrue(
    current: &Resources,
    rates: &ProductionRates,
    cap: &Resources,
    elapsed_ms: u64,
) -> Resources {
    if elapsed_ms == 0 {
        return current.capped(cap);
    }
    let hours = Decimal::from(elapsed_ms)
        .checked_div(Decimal::from(nova_types::HOUR_MS))
        .unwrap_or(Decimal::ZERO);
    current.plus(&rates.per_hour.scaled(hours)).capped(cap)
}

/// Advance a player's stockpile from `from` to `to` at the current rates.
pub fn accrue_player(
    catalog: &dyn GameCatalog,
    economy: &EconomyConfig,
    speed: f64,
    player: &mut PlayerState,
    from: Timestamp,
    to: Timestamp,
) {
    let rates = player_rates(catalog, economy, speed, player);
    let cap = capacity(catalog, &player.buildings);
    player.resources = accrue(&player.resources, &rates, &cap, to.saturating_sub(from));
}

/// Clamp a player's stockpile to capacity after a discrete gain or a
/// storage loss.
pub fn clamp_player(catalog: &dyn GameCatalog, player: &mut PlayerState) {
    let cap = capacity(catalog, &player.buildings);
    player.resources = player.resources.capped(&cap);
}
