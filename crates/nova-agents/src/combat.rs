//! Battle resolution.
//!
//! Battles are resolved in a single exchange from aggregate power rather
//! than round by round.
//!
//! ## Combat flow
//!
//! 1. Compute effective per-unit stats (technology, upgrades, boosts, plague)
//! 2. Sum each side's power: `attack + shield + hull / 10` per unit
//! 3. Derive each side's loss fraction from the opponent/own power ratio
//! 4. Destroy `floor(count * fraction)` of every unit type
//! 5. Leave debris worth a share of destroyed metal and crystal
//!
//! The loss fraction `clamp((1.5 r - 0.5) / (r + 1), 0, 1)` is strictly
//! increasing in `r`: equal forces lose half of each side and a threefold
//! advantage wipes the weaker side without own losses.

use std::collections::BTreeMap;

use nova_types::{
    BattleOutcome, BattleReport, BoostType, CombatUnit, Coordinates, DebrisField, Defenses,
    DefenseType, EntityId, Fleet, PlayerState, ResearchLevels, ResearchType, Resources,
    ShipLevels, ShipType, count_of,
};
use nova_world::catalog::{GameCatalog, fleet_cargo, to_decimal, to_f64};
use rust_decimal::Decimal;

use crate::config::CombatConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Divisor applied to hull points when summing power.
pub const HULL_POWER_DIVISOR: f64 = 10.0;

// ---------------------------------------------------------------------------
// CombatSide
// ---------------------------------------------------------------------------

/// One participant in a battle.
#[derive(Debug, Clone, Default)]
pub struct CombatSide {
    /// Display name for reports.
    pub name: String,
    /// Ships present.
    pub fleet: Fleet,
    /// Defense structures present (defender only).
    pub defenses: Defenses,
    /// Research levels for weapons, shielding and armour.
    pub research: ResearchLevels,
    /// Per-ship upgrade tiers.
    pub ship_levels: ShipLevels,
    /// Level of an active combat boost.
    pub combat_boost: u32,
    /// Plague-infected ship types.
    pub infected: Vec<ShipType>,
}

impl CombatSide {
    /// A player's side: home fleet and defenses with every modifier.
    pub fn player_home(state: &PlayerState) -> Self {
        Self {
            name: state.name.clone(),
            fleet: state.fleet.clone(),
            defenses: state.defenses.clone(),
            ..Self::player_fleet(state, Fleet::new())
        }
    }

    /// A player's travelling fleet with every modifier.
    pub fn player_fleet(state: &PlayerState, fleet: Fleet) -> Self {
        Self {
            name: state.name.clone(),
            fleet,
            defenses: Defenses::new(),
            research: state.research.clone(),
            ship_levels: state.ship_levels.clone(),
            combat_boost: state.boost_level(BoostType::Combat),
            infected: state.events.plague.infected.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// BattleResult
// ---------------------------------------------------------------------------

/// What a battle did to both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleResult {
    /// Result from the attacker's perspective.
    pub outcome: BattleOutcome,
    /// Attacker aggregate power.
    pub attacker_power: f64,
    /// Defender aggregate power.
    pub defender_power: f64,
    /// Attacker ships destroyed.
    pub attacker_losses: Fleet,
    /// Defender ships destroyed.
    pub defender_ship_losses: Fleet,
    /// Defender structures destroyed.
    pub defender_defense_losses: Defenses,
    /// Attacker ships left.
    pub attacker_survivors: Fleet,
    /// Defender ships left.
    pub defender_fleet_survivors: Fleet,
    /// Defender structures left.
    pub defender_defense_survivors: Defenses,
    /// Salvage produced by the destroyed units.
    pub debris: DebrisField,
}

impl BattleResult {
    /// A report for the message log.
    pub fn report(
        &self,
        location: Coordinates,
        attacker: &str,
        defender: &str,
        loot: Resources,
    ) -> BattleReport {
        BattleReport {
            location,
            attacker: attacker.to_owned(),
            defender: defender.to_owned(),
            outcome: self.outcome,
            attacker_power: self.attacker_power,
            defender_power: self.defender_power,
            attacker_losses: self.attacker_losses.clone(),
            defender_ship_losses: self.defender_ship_losses.clone(),
            defender_defense_losses: self.defender_defense_losses.clone(),
            loot,
            debris: self.debris,
        }
    }
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// Power contributed by one unit of a type on a given side.
pub fn unit_power(
    catalog: &dyn GameCatalog,
    config: &CombatConfig,
    side: &CombatSide,
    unit: CombatUnit,
) -> f64 {
    let stats = catalog.combat_stats(unit);
    let tech = |research: ResearchType| {
        f64::from(count_of(&side.research, &research)).mul_add(config.tech_bonus_per_level, 1.0)
    };
    let upgrade = match unit {
        CombatUnit::Ship(ship) => f64::from(count_of(&side.ship_levels, &ship))
            .mul_add(config.upgrade_bonus_per_level, 1.0),
        CombatUnit::Defense(_) => 1.0,
    };
    let plague = match unit {
        CombatUnit::Ship(ship) if side.infected.contains(&ship) => {
            (1.0 - config.plague_attack_penalty).max(0.0)
        }
        _ => 1.0,
    };
    let boost = f64::from(side.combat_boost).mul_add(config.combat_boost_per_level, 1.0);

    let attack = stats.attack * tech(ResearchType::WeaponsTechnology) * upgrade * plague * boost;
    let shield = stats.shield * tech(ResearchType::ShieldingTechnology) * upgrade;
    let hull = stats.hull * tech(ResearchType::ArmourTechnology) * upgrade;
    attack + shield + hull / HULL_POWER_DIVISOR
}

/// Aggregate power of a side.
pub fn side_power(catalog: &dyn GameCatalog, config: &CombatConfig, side: &CombatSide) -> f64 {
    let ships: f64 = side
        .fleet
        .iter()
        .map(|(ship, count)| {
            unit_power(catalog, config, side, CombatUnit::Ship(*ship)) * f64::from(*count)
        })
        .sum();
    let defenses: f64 = side
        .defenses
        .iter()
        .map(|(defense, count)| {
            unit_power(catalog, config, side, CombatUnit::Defense(*defense)) * f64::from(*count)
        })
        .sum();
    ships + defenses
}

/// Share of a side destroyed when facing `opponent` power with `own` power.
pub fn loss_fraction(own: f64, opponent: f64) -> f64 {
    if opponent <= 0.0 {
        return 0.0;
    }
    if own <= 0.0 {
        return 1.0;
    }
    let ratio = opponent / own;
    ((1.5 * ratio - 0.5) / (ratio + 1.0)).clamp(0.0, 1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn apply_losses<K: Ord + Copy>(
    units: &BTreeMap<K, u32>,
    fraction: f64,
) -> (BTreeMap<K, u32>, BTreeMap<K, u32>) {
    let mut lost = BTreeMap::new();
    let mut left = BTreeMap::new();
    for (unit, count) in units {
        let destroyed = (f64::from(*count) * fraction).floor().clamp(0.0, f64::from(*count)) as u32;
        if destroyed > 0 {
            lost.insert(*unit, destroyed);
        }
        let remaining = count.saturating_sub(destroyed);
        if remaining > 0 {
            left.insert(*unit, remaining);
        }
    }
    (lost, left)
}

fn salvage(catalog: &dyn GameCatalog, lost: impl Iterator<Item = (EntityId, u32)>) -> Resources {
    lost.fold(Resources::ZERO, |acc, (entity, count)| {
        acc.plus(&catalog.cost(entity, count))
    })
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a battle between an attacking fleet and a defending planet or
/// fleet.
pub fn resolve_battle(
    catalog: &dyn GameCatalog,
    config: &CombatConfig,
    attacker: &CombatSide,
    defender: &CombatSide,
) -> BattleResult {
    let attacker_power = side_power(catalog, config, attacker);
    let defender_power = side_power(catalog, config, defender);

    let (attacker_losses, attacker_survivors) =
        apply_losses(&attacker.fleet, loss_fraction(attacker_power, defender_power));
    let defender_fraction = loss_fraction(defender_power, attacker_power);
    let (defender_ship_losses, defender_fleet_survivors) =
        apply_losses(&defender.fleet, defender_fraction);
    let (defender_defense_losses, defender_defense_survivors): (Defenses, Defenses) =
        apply_losses(&defender.defenses, defender_fraction);

    let attacker_left = !attacker_survivors.is_empty();
    let defender_left =
        !defender_fleet_survivors.is_empty() || !defender_defense_survivors.is_empty();
    let outcome = match (attacker_left, defender_left) {
        (true, false) => BattleOutcome::AttackerWins,
        (false, true) => BattleOutcome::DefenderWins,
        _ => BattleOutcome::Draw,
    };

    let destroyed = salvage(
        catalog,
        attacker_losses
            .iter()
            .chain(defender_ship_losses.iter())
            .map(|(s, n)| (EntityId::Ship(*s), *n))
            .chain(
                defender_defense_losses
                    .iter()
                    .map(|(d, n): (&DefenseType, &u32)| (EntityId::Defense(*d), *n)),
            ),
    );
    let rate = to_decimal(config.debris_recovery_rate);
    let debris = DebrisField {
        metal: destroyed.metal.saturating_mul(rate).floor(),
        crystal: destroyed.crystal.saturating_mul(rate).floor(),
    };

    BattleResult {
        outcome,
        attacker_power,
        defender_power,
        attacker_losses,
        defender_ship_losses,
        defender_defense_losses,
        attacker_survivors,
        defender_fleet_survivors,
        defender_defense_survivors,
        debris,
    }
}

/// Resources a victorious attacker carries off.
///
/// The defender keeps `capacity * protected_fraction` of each resource;
/// the attacker takes `loot_fraction` of the rest, scaled down
/// proportionally when it exceeds `cargo`.
pub fn plunder(
    config: &CombatConfig,
    protected_fraction: f64,
    stock: &Resources,
    capacity: &Resources,
    cargo: Decimal,
) -> Resources {
    let protected = capacity.scaled(to_decimal(protected_fraction));
    let exposed = stock.minus_floored(&protected);
    let wanted = exposed.scaled(to_decimal(config.loot_fraction)).floored();
    let total = wanted.total();
    if total <= cargo || total.is_zero() {
        return wanted;
    }
    let share = cargo.checked_div(total).unwrap_or(Decimal::ZERO);
    wanted.scaled(share).floored()
}

/// Cargo left for loot on a fleet already carrying `carried`.
pub fn free_cargo(catalog: &dyn GameCatalog, fleet: &Fleet, carried: &Resources) -> Decimal {
    to_decimal(fleet_cargo(catalog, fleet))
        .saturating_sub(carried.total())
        .max(Decimal::ZERO)
}

/// Catalog value (all three resources) of one ship.
pub fn unit_value(catalog: &dyn GameCatalog, ship: ShipType) -> f64 {
    to_f64(catalog.cost(EntityId::Ship(ship), 1).total())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_world::StandardCatalog;

    use nova_types::unit_total;

    use super::*;

    fn side(fleet: &[(ShipType, u32)], defenses: &[(DefenseType, u32)]) -> CombatSide {
        CombatSide {
            name: "side".into(),
            fleet: fleet.iter().copied().collect(),
            defenses: defenses.iter().copied().collect(),
            ..CombatSide::default()
        }
    }

    #[test]
    fn loss_curve_anchor_points() {
        assert!((loss_fraction(100.0, 100.0) - 0.5).abs() < 1e-9);
        assert!((loss_fraction(100.0, 300.0) - 1.0).abs() < 1e-9);
        assert!(loss_fraction(300.0, 100.0).abs() < 1e-9);
        assert!(loss_fraction(100.0, 0.0).abs() < 1e-9);
        assert!((loss_fraction(0.0, 10.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn defender_losses_grow_with_attacker_power() {
        let catalog = StandardCatalog;
        let config = CombatConfig::default();
        let defender = side(
            &[(ShipType::LightFighter, 100)],
            &[(DefenseType::RocketLauncher, 100)],
        );
        let mut previous = 0_u64;
        for n in [1_u32, 10, 40, 80, 120, 200, 400, 1000] {
            let attacker = side(&[(ShipType::HeavyFighter, n)], &[]);
            let result = resolve_battle(&catalog, &config, &attacker, &defender);
            let lost = unit_total(&result.defender_ship_losses)
                .saturating_add(unit_total(&result.defender_defense_losses));
            assert!(lost >= previous, "{n} heavy fighters destroyed {lost} < {previous}");
            previous = lost;
        }
        assert_eq!(previous, 200);
    }

    #[test]
    fn overwhelming_attack_wins_cleanly() {
        let catalog = StandardCatalog;
        let config = CombatConfig::default();
        let attacker = side(&[(ShipType::Battleship, 50)], &[]);
        let defender = side(&[], &[(DefenseType::RocketLauncher, 10)]);
        let result = resolve_battle(&catalog, &config, &attacker, &defender);
        assert_eq!(result.outcome, BattleOutcome::AttackerWins);
        assert!(result.attacker_losses.is_empty());
        assert_eq!(count_of(&result.defender_defense_losses, &DefenseType::RocketLauncher), 10);
        // 10 launchers * 2000 metal * 0.3
        assert_eq!(result.debris.metal, Decimal::from(6000));
    }

    #[test]
    fn undefended_target_is_a_walkover() {
        let catalog = StandardCatalog;
        let config = CombatConfig::default();
        let attacker = side(&[(ShipType::SmallCargo, 2)], &[]);
        let result = resolve_battle(&catalog, &config, &attacker, &CombatSide::default());
        assert_eq!(result.outcome, BattleOutcome::AttackerWins);
        assert_eq!(result.attacker_survivors, attacker.fleet);
        assert!(result.debris.is_empty());
    }

    #[test]
    fn technology_and_plague_change_power() {
        let catalog = StandardCatalog;
        let config = CombatConfig::default();
        let plain = side(&[(ShipType::Cruiser, 10)], &[]);
        let mut armed = plain.clone();
        armed.research.insert(ResearchType::WeaponsTechnology, 5);
        let mut sick = plain.clone();
        sick.infected.push(ShipType::Cruiser);
        let base = side_power(&catalog, &config, &plain);
        assert!(side_power(&catalog, &config, &armed) > base);
        assert!(side_power(&catalog, &config, &sick) < base);
    }

    #[test]
    fn plunder_respects_protection_and_cargo() {
        let config = CombatConfig::default();
        let stock = Resources::from_units(20_000, 10_000, 0);
        let capacity = Resources::from_units(10_000, 10_000, 10_000);
        let loot = plunder(&config, 0.1, &stock, &capacity, Decimal::from(1_000_000));
        assert_eq!(loot, Resources::from_units(9_500, 4_500, 0));

        let capped = plunder(&config, 0.1, &stock, &capacity, Decimal::from(1_400));
        assert!(capped.total() <= Decimal::from(1_400));
        assert!(capped.metal > capped.crystal);
    }
}
