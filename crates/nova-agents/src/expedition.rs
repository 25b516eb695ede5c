//! Expedition and exploration outcome tables.
//!
//! Both mission types draw one weighted outcome. Gains and losses are
//! sized from the travelling fleet's catalog value and applied to the
//! mission in place, so that whatever survives is what comes home.

use nova_types::{
    Boost, BoostId, BoostType, ExpeditionOutcome, ExplorationOutcome, Fleet, FleetMission,
    HOUR_MS, MessageBody, Resources, ShipType, count_of, merge_counts, subtract_counts,
};
use nova_world::catalog::{fleet_value, to_decimal};
use nova_world::rng::weighted_pick;
use rand::Rng;
use rust_decimal::Decimal;

use crate::combat::{CombatSide, free_cargo, resolve_battle};
use crate::rules::Ruleset;

/// Draw an expedition outcome from the configured weights.
pub fn draw_expedition<R: Rng>(rng: &mut R, weights: &[u32; 8]) -> ExpeditionOutcome {
    let table: Vec<_> = ExpeditionOutcome::ALL.into_iter().zip(weights.iter().copied()).collect();
    weighted_pick(rng, &table).unwrap_or(ExpeditionOutcome::Nothing)
}

/// Draw an exploration outcome from the configured weights.
pub fn draw_exploration<R: Rng>(rng: &mut R, weights: &[u32; 5]) -> ExplorationOutcome {
    let table: Vec<_> = ExplorationOutcome::ALL.into_iter().zip(weights.iter().copied()).collect();
    weighted_pick(rng, &table).unwrap_or(ExplorationOutcome::Nothing)
}

/// Scale `found` down proportionally so that it fits in `cargo`.
pub fn fit_to_cargo(found: &Resources, cargo: Decimal) -> Resources {
    let total = found.total();
    if total <= cargo {
        return *found;
    }
    let share = cargo.checked_div(total).unwrap_or(Decimal::ZERO);
    found.scaled(share).floored()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn share_of(count: u32, fraction: f64) -> u32 {
    (f64::from(count) * fraction).floor().clamp(0.0, f64::from(count)) as u32
}

/// Destroy a random share in `[low, high)` of every ship type.
fn lose_share<R: Rng>(fleet: &mut Fleet, rng: &mut R, low: f64, high: f64) -> Fleet {
    let mut lost = Fleet::new();
    for (ship, count) in fleet.iter() {
        let n = share_of(*count, rng.random_range(low..high));
        if n > 0 {
            lost.insert(*ship, n);
        }
    }
    subtract_counts(fleet, &lost);
    lost
}

fn found_resources<R: Rng>(value: f64, rng: &mut R, low: f64, high: f64) -> Resources {
    Resources::new(
        to_decimal(value * rng.random_range(low..high)).floor(),
        to_decimal(value * rng.random_range(low..high) * 0.6).floor(),
        to_decimal(value * rng.random_range(low..high) * 0.3).floor(),
    )
}

// ---------------------------------------------------------------------------
// Expedition
// ---------------------------------------------------------------------------

/// Resolve an expedition that has just arrived. Mutates the mission and
/// returns the message to post.
pub fn run_expedition<R: Rng>(
    rules: &Ruleset<'_>,
    mission: &mut FleetMission,
    rng: &mut R,
) -> MessageBody {
    let outcome = draw_expedition(rng, &rules.missions.expedition_weights);
    let value = fleet_value(rules.catalog, &mission.fleet);
    let mut resources = Resources::ZERO;
    let mut credits = Decimal::ZERO;
    let mut ships = Fleet::new();
    let mut delay_ms = 0_u64;

    match outcome {
        ExpeditionOutcome::FindResources => {
            let cargo = free_cargo(rules.catalog, &mission.fleet, &mission.loot);
            resources = fit_to_cargo(&found_resources(value, rng, 0.05, 0.15), cargo);
            mission.loot = mission.loot.plus(&resources);
        }
        ExpeditionOutcome::FindMoney => {
            credits = to_decimal(value * rng.random_range(0.0005..0.002)).floor().max(Decimal::ONE);
            mission.loot_credits = mission.loot_credits.saturating_add(credits);
        }
        ExpeditionOutcome::FindFleet => {
            let kinds: Vec<ShipType> = mission
                .fleet
                .keys()
                .copied()
                .filter(|s| !matches!(s, ShipType::ColonyShip | ShipType::Deathstar))
                .collect();
            let pick = if kinds.is_empty() {
                ShipType::LightFighter
            } else {
                kinds
                    .get(rng.random_range(0..kinds.len()))
                    .copied()
                    .unwrap_or(ShipType::LightFighter)
            };
            let base = count_of(&mission.fleet, &pick);
            let n = share_of(base, rng.random_range(0.1..0.3)).max(1);
            ships.insert(pick, n);
            merge_counts(&mut mission.fleet, &ships);
        }
        ExpeditionOutcome::Nothing => {}
        ExpeditionOutcome::Pirates => ships = lose_share(&mut mission.fleet, rng, 0.1, 0.3),
        ExpeditionOutcome::Aliens => ships = lose_share(&mut mission.fleet, rng, 0.3, 0.6),
        ExpeditionOutcome::Delay => {
            let leg = mission.return_time.saturating_sub(mission.arrival_time);
            let factor = rng.random_range(0.5..1.5);
            delay_ms = to_ms(leg, factor);
            mission.return_time = mission.return_time.saturating_add(delay_ms);
        }
        ExpeditionOutcome::Lost => {
            ships = std::mem::take(&mut mission.fleet);
            mission.loot = Resources::ZERO;
            mission.loot_credits = Decimal::ZERO;
        }
    }

    MessageBody::Expedition {
        outcome,
        resources,
        credits,
        ships,
        delay_ms,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn to_ms(leg: u64, factor: f64) -> u64 {
    let ms = (leg as f64 * factor).floor();
    if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 }
}

// ---------------------------------------------------------------------------
// Exploration
// ---------------------------------------------------------------------------

/// What an exploration produced besides changes to the mission itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationResult {
    /// Message to post.
    pub body: MessageBody,
    /// Boost to add to the player's inventory.
    pub boost: Option<Boost>,
}

/// Resolve the end of an exploration hold. Mutates the mission.
pub fn run_exploration<R: Rng>(
    rules: &Ruleset<'_>,
    side: &CombatSide,
    mission: &mut FleetMission,
    rng: &mut R,
) -> ExplorationResult {
    let outcome = draw_exploration(rng, &rules.missions.exploration_weights);
    let value = fleet_value(rules.catalog, &mission.fleet);
    let mut boost = None;

    let detail = match outcome {
        ExplorationOutcome::Hostiles => {
            let threat = spawn_threat(rules, value, rng);
            let attacker = CombatSide {
                fleet: mission.fleet.clone(),
                ..side.clone()
            };
            let defender = CombatSide {
                name: "Hostiles".to_owned(),
                fleet: threat,
                ..CombatSide::default()
            };
            let result = resolve_battle(rules.catalog, rules.combat, &attacker, &defender);
            let lost: u64 = nova_types::unit_total(&result.attacker_losses);
            mission.fleet = result.attacker_survivors;
            format!("Hostile ships engaged the fleet; {lost} ship(s) lost")
        }
        ExplorationOutcome::FindBoost => {
            let boost_type = BoostType::ALL
                .get(rng.random_range(0..BoostType::ALL.len()))
                .copied()
                .unwrap_or(BoostType::Production);
            let level = rng.random_range(1..=3_u32);
            let hours = rng.random_range(1..=4_u64);
            boost = Some(Boost {
                id: BoostId::from_u128(rng.random()),
                boost_type,
                level,
                duration_ms: hours.saturating_mul(HOUR_MS),
            });
            format!("Recovered a level {level} {boost_type:?} boost")
        }
        ExplorationOutcome::FindResources => {
            let cargo = free_cargo(rules.catalog, &mission.fleet, &mission.loot);
            let found = fit_to_cargo(&found_resources(value, rng, 0.02, 0.08), cargo);
            mission.loot = mission.loot.plus(&found);
            format!(
                "Collected {} metal, {} crystal and {} deuterium",
                found.metal, found.crystal, found.deuterium
            )
        }
        ExplorationOutcome::FindShipWreck => {
            let ship = [ShipType::SmallCargo, ShipType::LightFighter, ShipType::HeavyFighter]
                .get(rng.random_range(0..3_usize))
                .copied()
                .unwrap_or(ShipType::SmallCargo);
            let n = rng.random_range(1..=5_u32);
            let mut salvaged = Fleet::new();
            salvaged.insert(ship, n);
            merge_counts(&mut mission.fleet, &salvaged);
            format!("Restored {n} x {ship:?} from a wreck")
        }
        ExplorationOutcome::Nothing => "Nothing of interest was found".to_owned(),
    };

    ExplorationResult {
        body: MessageBody::Exploration {
            outcome,
            target: mission.target,
            detail,
        },
        boost,
    }
}

/// A light-fighter swarm worth 30-80% of the explorer's fleet value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn spawn_threat<R: Rng>(rules: &Ruleset<'_>, value: f64, rng: &mut R) -> Fleet {
    let unit = crate::combat::unit_value(rules.catalog, ShipType::LightFighter).max(1.0);
    let budget = value * rng.random_range(0.3..0.8);
    let count = (budget / unit).floor().clamp(1.0, f64::from(u32::MAX)) as u32;
    let mut threat = Fleet::new();
    threat.insert(ShipType::LightFighter, count);
    threat
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_types::{Coordinates, MissionId, MissionType};
    use nova_world::rng::seeded;

    use super::*;
    use crate::test_support::Fixture;

    fn mission(fleet: &[(ShipType, u32)]) -> FleetMission {
        FleetMission {
            id: MissionId::from_u128(5),
            mission_type: MissionType::Expedition,
            fleet: fleet.iter().copied().collect(),
            origin: Coordinates::new(1, 1, 1),
            target: Coordinates::new(1, 1, 15),
            start_time: 0,
            arrival_time: 1000,
            return_time: 2000,
            exploration_end_time: None,
            arrival_processed: false,
            exploration_processed: false,
            recalled: false,
            loot: Resources::ZERO,
            loot_credits: Decimal::ZERO,
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn expedition_distribution_matches_weights() {
        let weights = [30_u32, 10, 10, 25, 8, 5, 9, 3];
        let total: u32 = weights.iter().sum();
        let mut rng = seeded(&[2024]);
        let draws = 10_000_u32;
        let mut counts = [0_u32; 8];
        for _ in 0..draws {
            let outcome = draw_expedition(&mut rng, &weights);
            let idx = ExpeditionOutcome::ALL.iter().position(|o| *o == outcome).unwrap();
            *counts.get_mut(idx).unwrap() += 1;
        }
        for (count, weight) in counts.iter().zip(weights) {
            let observed = f64::from(*count) / f64::from(draws);
            let expected = f64::from(weight) / f64::from(total);
            assert!(
                (observed - expected).abs() < 0.02,
                "observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn lost_always_zeroes_the_fleet() {
        let fx = Fixture::default();
        let mut missions = fx.missions.clone();
        missions.expedition_weights = [0, 0, 0, 0, 0, 0, 0, 1];
        let rules = crate::rules::Ruleset {
            missions: &missions,
            ..fx.rules()
        };
        let mut rng = seeded(&[3]);
        for _ in 0..100 {
            let mut m = mission(&[(ShipType::LargeCargo, 10), (ShipType::Cruiser, 3)]);
            m.loot = Resources::from_units(10, 10, 10);
            let body = run_expedition(&rules, &mut m, &mut rng);
            assert!(m.fleet.is_empty());
            assert!(m.loot.is_zero());
            assert!(matches!(
                body,
                MessageBody::Expedition {
                    outcome: ExpeditionOutcome::Lost,
                    ..
                }
            ));
        }
    }

    #[test]
    fn found_resources_fit_in_cargo() {
        let fx = Fixture::default();
        let mut missions = fx.missions.clone();
        missions.expedition_weights = [1, 0, 0, 0, 0, 0, 0, 0];
        let rules = crate::rules::Ruleset {
            missions: &missions,
            ..fx.rules()
        };
        let mut rng = seeded(&[4]);
        let mut m = mission(&[(ShipType::Battleship, 100), (ShipType::SmallCargo, 1)]);
        run_expedition(&rules, &mut m, &mut rng);
        let cargo = free_cargo(rules.catalog, &m.fleet, &Resources::ZERO);
        assert!(m.loot.total() <= cargo);
        assert!(!m.loot.is_zero());
    }

    #[test]
    fn delay_extends_return() {
        let fx = Fixture::default();
        let mut missions = fx.missions.clone();
        missions.expedition_weights = [0, 0, 0, 0, 0, 0, 1, 0];
        let rules = crate::rules::Ruleset {
            missions: &missions,
            ..fx.rules()
        };
        let mut m = mission(&[(ShipType::SmallCargo, 1)]);
        run_expedition(&rules, &mut m, &mut seeded(&[5]));
        assert!(m.return_time >= 2500);
        assert_eq!(m.fleet.len(), 1);
    }

    #[test]
    fn boost_finds_land_in_result() {
        let fx = Fixture::default();
        let mut missions = fx.missions.clone();
        missions.exploration_weights = [0, 1, 0, 0, 0];
        let rules = crate::rules::Ruleset {
            missions: &missions,
            ..fx.rules()
        };
        let mut m = mission(&[(ShipType::SmallCargo, 1)]);
        let result = run_exploration(&rules, &CombatSide::default(), &mut m, &mut seeded(&[6]));
        let boost = result.boost.unwrap();
        assert!((1..=3).contains(&boost.level));
    }
}
