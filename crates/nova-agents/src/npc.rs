//! NPC evolution and NPC fleet missions.
//!
//! NPCs evolve in fixed-length cycles. Each cycle accrues production,
//! runs a short greedy build loop over the personality's priority list and
//! may launch one mission against the nearest player home in the same
//! galaxy. Long absences are bounded: only the most recent cycles are
//! simulated in full, older time is accrued without building.
//!
//! Every cycle draws from a generator seeded by the NPC's coordinate and
//! the cycle end time, so the outcome does not depend on which player's
//! catch-up happens to run it.

use nova_types::{
    BattleOutcome, BuildingType, Coordinates, DefenseType, EntityId, Fleet, GlobalState, HOUR_MS,
    MessageBody, MissionId, MissionType, Notification, NotificationKind, NpcFleetMission,
    NpcState, Personality, PlayerId, PlayerState, ResearchType, Resources, ShipType, Timestamp,
    count_of, merge_counts, subtract_counts,
};
use nova_world::catalog::requirements_met;
use nova_world::{galaxy, production};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::combat::{CombatSide, free_cargo, plunder, resolve_battle, side_power};
use crate::mail;
use crate::missions::{fleet_speed, travel_ms};
use crate::rules::Ruleset;

// ---------------------------------------------------------------------------
// Priorities
// ---------------------------------------------------------------------------

use BuildingType as B;
use DefenseType as D;
use ResearchType as R;
use ShipType as S;

const AGGRESSIVE: [(EntityId, u32); 9] = [
    (EntityId::Ship(S::Battleship), 1),
    (EntityId::Ship(S::Cruiser), 2),
    (EntityId::Research(R::WeaponsTechnology), 1),
    (EntityId::Ship(S::HeavyFighter), 3),
    (EntityId::Research(R::ArmourTechnology), 1),
    (EntityId::Ship(S::LightFighter), 5),
    (EntityId::Building(B::Shipyard), 1),
    (EntityId::Building(B::MetalMine), 1),
    (EntityId::Building(B::SolarPlant), 1),
];

const ECONOMIC: [(EntityId, u32); 9] = [
    (EntityId::Building(B::SolarPlant), 1),
    (EntityId::Building(B::MetalMine), 1),
    (EntityId::Building(B::CrystalMine), 1),
    (EntityId::Building(B::DeuteriumSynthesizer), 1),
    (EntityId::Building(B::MetalStorage), 1),
    (EntityId::Building(B::CrystalStorage), 1),
    (EntityId::Building(B::ResearchLab), 1),
    (EntityId::Research(R::EnergyTechnology), 1),
    (EntityId::Defense(D::RocketLauncher), 5),
];

const BALANCED: [(EntityId, u32); 9] = [
    (EntityId::Building(B::MetalMine), 1),
    (EntityId::Building(B::SolarPlant), 1),
    (EntityId::Ship(S::HeavyFighter), 2),
    (EntityId::Building(B::CrystalMine), 1),
    (EntityId::Research(R::WeaponsTechnology), 1),
    (EntityId::Ship(S::LightFighter), 3),
    (EntityId::Defense(D::LightLaser), 3),
    (EntityId::Building(B::ResearchLab), 1),
    (EntityId::Building(B::Shipyard), 1),
];

/// Build priorities of a personality, most wanted first. The second
/// element is the batch size for ships and defenses.
pub const fn priorities(personality: Personality) -> &'static [(EntityId, u32)] {
    match personality {
        Personality::Aggressive => &AGGRESSIVE,
        Personality::Economic => &ECONOMIC,
        Personality::Balanced => &BALANCED,
    }
}

// ---------------------------------------------------------------------------
// Evolution
// ---------------------------------------------------------------------------

const fn cycle_ms(rules: &Ruleset<'_>) -> u64 {
    rules.npc.cycle_secs.saturating_mul(1000)
}

/// When the NPC's next evolution cycle completes.
pub const fn next_cycle_at(rules: &Ruleset<'_>, npc: &NpcState) -> Timestamp {
    npc.last_update.saturating_add(cycle_ms(rules))
}

/// Combat power of an NPC's home fleet and defenses.
pub fn npc_power(rules: &Ruleset<'_>, npc: &NpcState) -> f64 {
    side_power(
        rules.catalog,
        rules.combat,
        &CombatSide {
            name: npc.name.clone(),
            fleet: npc.fleet.clone(),
            defenses: npc.defenses.clone(),
            research: npc.research.clone(),
            ..CombatSide::default()
        },
    )
}

fn accrue(rules: &Ruleset<'_>, npc: &mut NpcState, elapsed_ms: u64) {
    let rates = production::npc_rates(
        rules.catalog,
        rules.economy,
        rules.universe.economy_speed,
        npc,
    );
    let cap = production::capacity(rules.catalog, &npc.buildings);
    npc.resources = production::accrue(&npc.resources, &rates, &cap, elapsed_ms);
}

/// Accrue production for any backlog older than the simulated window
/// without building, so that at most `max_cycles_per_catch_up` full cycles
/// remain before `now`.
pub fn fast_forward(rules: &Ruleset<'_>, npc: &mut NpcState, now: Timestamp) {
    let window = cycle_ms(rules).saturating_mul(u64::from(rules.npc.max_cycles_per_catch_up));
    let horizon = now.saturating_sub(window);
    if horizon > npc.last_update {
        accrue(rules, npc, horizon.saturating_sub(npc.last_update));
        debug!(
            coords = %npc.coords,
            skipped_ms = horizon.saturating_sub(npc.last_update),
            "npc backlog accrued"
        );
        npc.last_update = horizon;
    }
}

fn current(npc: &NpcState, entity: EntityId) -> u32 {
    match entity {
        EntityId::Building(b) => count_of(&npc.buildings, &b),
        EntityId::Research(r) => count_of(&npc.research, &r),
        EntityId::Ship(s) => count_of(&npc.fleet, &s),
        EntityId::Defense(d) => count_of(&npc.defenses, &d),
    }
}

fn commit(npc: &mut NpcState, entity: EntityId, batch: u32) {
    let next = |n: u32, by: u32| n.saturating_add(by);
    match entity {
        EntityId::Building(b) => {
            let level = next(current(npc, entity), 1);
            npc.buildings.insert(b, level);
        }
        EntityId::Research(r) => {
            let level = next(current(npc, entity), 1);
            npc.research.insert(r, level);
        }
        EntityId::Ship(s) => {
            let count = next(current(npc, entity), batch);
            npc.fleet.insert(s, count);
        }
        EntityId::Defense(d) => {
            let count = next(current(npc, entity), batch);
            npc.defenses.insert(d, count);
        }
    }
}

/// Greedy build loop: each iteration commits the first affordable,
/// unlocked entry of the priority list. Returns what was built.
pub fn build_greedily(rules: &Ruleset<'_>, npc: &mut NpcState) -> Vec<EntityId> {
    let mut built = Vec::new();
    for _ in 0..rules.npc.build_iterations {
        let choice = priorities(npc.personality).iter().find_map(|(entity, batch)| {
            let amount = match entity {
                EntityId::Building(_) | EntityId::Research(_) => {
                    current(npc, *entity).saturating_add(1)
                }
                EntityId::Ship(_) | EntityId::Defense(_) => *batch,
            };
            let unlocked = requirements_met(
                &rules.catalog.requirements(*entity),
                &npc.buildings,
                &npc.research,
            );
            let cost = rules.catalog.cost(*entity, amount);
            (unlocked && npc.resources.covers(&cost)).then_some((*entity, *batch, cost))
        });
        let Some((entity, batch, cost)) = choice else {
            break;
        };
        npc.resources = npc.resources.minus_floored(&cost);
        commit(npc, entity, batch);
        built.push(entity);
    }
    built
}

/// The nearest registered player home in the NPC's galaxy.
pub fn nearest_home(global: &GlobalState, from: &Coordinates) -> Option<(PlayerId, Coordinates)> {
    global
        .planets
        .iter()
        .filter(|(coords, record)| record.is_home && coords.galaxy == from.galaxy)
        .min_by_key(|(coords, _)| from.distance_to(coords))
        .map(|(coords, record)| (record.owner, *coords))
}

/// Run one full evolution cycle ending at `next_cycle_at(npc)`.
///
/// `target` is the home the NPC would strike, if any.
pub fn evolve_cycle<G: Rng>(
    rules: &Ruleset<'_>,
    npc: &mut NpcState,
    target: Option<(PlayerId, Coordinates)>,
    rng: &mut G,
) -> Option<NpcFleetMission> {
    let cycle_end = next_cycle_at(rules, npc);
    accrue(rules, npc, cycle_ms(rules));
    let built = build_greedily(rules, npc);
    npc.last_update = cycle_end;
    if !built.is_empty() {
        debug!(coords = %npc.coords, ?built, "npc built");
    }

    if npc.personality != Personality::Aggressive
        || npc_power(rules, npc) <= rules.npc.attack_power_threshold
    {
        return None;
    }
    let (player, home) = target?;
    let attack = rng.random_bool(rules.npc.attack_probability.clamp(0.0, 1.0));
    let spy = !attack && rng.random_bool(rules.npc.spy_probability.clamp(0.0, 1.0));

    let (mission_type, fleet) = if attack {
        let half: Fleet = npc
            .fleet
            .iter()
            .filter(|(ship, _)| ship.is_combat_ship())
            .map(|(ship, count)| (*ship, count / 2))
            .filter(|(_, count)| *count > 0)
            .collect();
        (MissionType::Attack, half)
    } else if spy && count_of(&npc.fleet, &ShipType::EspionageProbe) > 0 {
        let mut probe = Fleet::new();
        probe.insert(ShipType::EspionageProbe, 1);
        (MissionType::Spy, probe)
    } else {
        return None;
    };
    if fleet.is_empty() {
        return None;
    }

    let distance = npc.coords.distance_to(&home);
    let leg = travel_ms(rules, distance, fleet_speed(rules.catalog, &fleet, &npc.research));
    if !subtract_counts(&mut npc.fleet, &fleet) {
        return None;
    }
    let arrival_time = cycle_end.saturating_add(leg);
    let mission = NpcFleetMission {
        id: MissionId::from_u128(rng.random()),
        npc: npc.coords,
        target_player: player,
        target: home,
        mission_type,
        fleet,
        start_time: cycle_end,
        arrival_time,
        return_time: arrival_time.saturating_add(leg),
        arrival_processed: false,
        loot: Resources::ZERO,
    };
    debug!(npc = %npc.coords, target = %home, ?mission_type, arrival_time, "npc mission launched");
    Some(mission)
}

// ---------------------------------------------------------------------------
// NPC missions against players
// ---------------------------------------------------------------------------

/// Resolve an NPC mission arriving at the player's home.
pub fn resolve_npc_arrival<G: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    id: MissionId,
    rng: &mut G,
) -> Vec<Notification> {
    let Some(mut mission) = global.npc_missions.iter().find(|m| m.id == id).cloned() else {
        warn!(%id, "npc arrival for unknown mission skipped");
        return Vec::new();
    };
    if mission.arrival_processed || mission.target_player != state.id {
        return Vec::new();
    }
    let at = mission.arrival_time;
    let (npc_name, npc_research) = global.npcs.get(&mission.npc).map_or_else(
        || ("Unknown raiders".to_owned(), Default::default()),
        |npc| (npc.name.clone(), npc.research.clone()),
    );
    let cap = rules.economy.message_cap;
    let mut notes = Vec::new();

    match mission.mission_type {
        MissionType::Attack => {
            let attacker = CombatSide {
                name: npc_name.clone(),
                fleet: mission.fleet.clone(),
                research: npc_research,
                ..CombatSide::default()
            };
            let defender = CombatSide::player_home(state);
            let result = resolve_battle(rules.catalog, rules.combat, &attacker, &defender);
            let loot = if result.outcome == BattleOutcome::AttackerWins {
                let capacity = production::capacity(rules.catalog, &state.buildings);
                let cargo = free_cargo(rules.catalog, &result.attacker_survivors, &mission.loot);
                plunder(
                    rules.combat,
                    rules.economy.protected_fraction,
                    &state.resources,
                    &capacity,
                    cargo,
                )
            } else {
                Resources::ZERO
            };
            state.fleet.clone_from(&result.defender_fleet_survivors);
            state.defenses.clone_from(&result.defender_defense_survivors);
            state.resources = state.resources.minus_floored(&loot);
            galaxy::add_debris(global, state.home, result.debris.metal, result.debris.crystal);
            mission.fleet.clone_from(&result.attacker_survivors);
            mission.loot = mission.loot.plus(&loot);

            let report = result.report(state.home, &npc_name, &state.name, loot);
            notes.push(Notification::new(
                at,
                NotificationKind::Battle,
                format!("{npc_name} attacked your home: {:?}", report.outcome),
            ));
            mail::post(state, cap, rng, at, MessageBody::Battle(report));
        }
        MissionType::Spy => {
            notes.push(Notification::new(
                at,
                NotificationKind::Espionage,
                format!("{npc_name} spied on your home"),
            ));
            mail::post(state, cap, rng, at, MessageBody::EspionageEvent {
                from: mission.npc,
                by: npc_name,
            });
        }
        other => warn!(%id, ?other, "npc mission type has no arrival effect"),
    }

    mission.arrival_processed = true;
    if let Some(slot) = global.npc_missions.iter_mut().find(|m| m.id == id) {
        *slot = mission;
    }
    notes
}

/// How long past its return time a raid whose target never caught up is
/// kept before the ships are sent home unresolved.
pub const UNRESOLVED_RAID_GRACE_MS: Timestamp = HOUR_MS.saturating_mul(24);

/// Send an NPC raid home without fighting. Used when its target has not
/// advanced past the arrival long after the fleet was due back.
pub fn expire_unresolved(rules: &Ruleset<'_>, global: &mut GlobalState, id: MissionId) {
    let Some(mission) = global.npc_missions.iter().find(|m| m.id == id) else {
        warn!(%id, "expiry for unknown npc mission skipped");
        return;
    };
    info!(
        %id,
        npc = %mission.npc,
        target = %mission.target_player,
        "npc raid expired unresolved"
    );
    settle_npc_return(rules, global, id);
}

/// Return an NPC mission's survivors and loot to its planet.
pub fn settle_npc_return(rules: &Ruleset<'_>, global: &mut GlobalState, id: MissionId) {
    let Some(idx) = global.npc_missions.iter().position(|m| m.id == id) else {
        warn!(%id, "npc return for unknown mission skipped");
        return;
    };
    let mission = global.npc_missions.remove(idx);
    if let Some(npc) = global.npcs.get_mut(&mission.npc) {
        merge_counts(&mut npc.fleet, &mission.fleet);
        let cap = production::capacity(rules.catalog, &npc.buildings);
        npc.resources = npc.resources.plus(&mission.loot).capped(&cap);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_world::galaxy::generate_npc;
    use nova_world::rng::seeded;

    use super::*;
    use crate::test_support::{Fixture, global_with_home, rich_player};

    fn npc(personality: Personality) -> NpcState {
        let mut npc = generate_npc(&Default::default(), Coordinates::new(1, 12, 7), 0);
        npc.personality = personality;
        npc
    }

    #[test]
    fn economic_npc_prefers_mines() {
        let fx = Fixture::default();
        let mut n = npc(Personality::Economic);
        n.resources = Resources::from_units(1_000_000, 1_000_000, 1_000_000);
        let built = build_greedily(&fx.rules(), &mut n);
        assert_eq!(built.first(), Some(&EntityId::Building(BuildingType::SolarPlant)));
        assert!(built.len() <= 5);
    }

    #[test]
    fn broke_npc_builds_nothing() {
        let fx = Fixture::default();
        let mut n = npc(Personality::Balanced);
        n.resources = Resources::ZERO;
        assert!(build_greedily(&fx.rules(), &mut n).is_empty());
    }

    #[test]
    fn backlog_is_bounded() {
        let fx = Fixture::default();
        let mut n = npc(Personality::Economic);
        let week = 7 * 24 * 3_600_000_u64;
        fast_forward(&fx.rules(), &mut n, week);
        assert_eq!(n.last_update, week - 48 * 3_600_000);
        fast_forward(&fx.rules(), &mut n, week);
        assert_eq!(n.last_update, week - 48 * 3_600_000);
    }

    #[test]
    fn aggressive_npc_attacks_nearest_home() {
        let fx = Fixture::default();
        let mut npc_cfg = fx.npc.clone();
        npc_cfg.attack_probability = 1.0;
        let rules = Ruleset {
            npc: &npc_cfg,
            ..fx.rules()
        };
        let player = rich_player();
        let global = global_with_home(&player);
        let mut n = npc(Personality::Aggressive);
        n.buildings.clear();
        n.research.clear();
        n.resources = Resources::ZERO;
        n.fleet = Fleet::from([(ShipType::Cruiser, 40)]);
        let target = nearest_home(&global, &n.coords);
        assert_eq!(target, Some((player.id, player.home)));

        let mission = evolve_cycle(&rules, &mut n, target, &mut seeded(&[1])).unwrap();
        assert_eq!(mission.mission_type, MissionType::Attack);
        assert_eq!(count_of(&mission.fleet, &ShipType::Cruiser), 20);
        assert_eq!(count_of(&n.fleet, &ShipType::Cruiser), 20);
        assert_eq!(n.last_update, 3_600_000);
        assert!(mission.arrival_time > mission.start_time);
    }

    #[test]
    fn npc_raid_is_resolved_against_player_home() {
        let fx = Fixture::default();
        let rules = fx.rules();
        let mut player = rich_player();
        let mut global = global_with_home(&player);
        let raider = npc(Personality::Aggressive);
        let mut fleet = Fleet::new();
        fleet.insert(ShipType::Battleship, 30);
        let id = MissionId::from_u128(99);
        global.npc_missions.push(NpcFleetMission {
            id,
            npc: raider.coords,
            target_player: player.id,
            target: player.home,
            mission_type: MissionType::Attack,
            fleet,
            start_time: 0,
            arrival_time: 10,
            return_time: 20,
            arrival_processed: false,
            loot: Resources::ZERO,
        });
        global.npcs.insert(raider.coords, raider.clone());

        let notes = resolve_npc_arrival(&rules, &mut player, &mut global, id, &mut seeded(&[2]));
        assert_eq!(notes.len(), 1);
        assert!(player.resources.metal < rich_player().resources.metal);
        let mission = global.npc_missions.first().unwrap();
        assert!(mission.arrival_processed);
        assert!(!mission.loot.is_zero());

        settle_npc_return(&rules, &mut global, id);
        assert!(global.npc_missions.is_empty());
        let home = global.npcs.get(&raider.coords).unwrap();
        assert!(count_of(&home.fleet, &ShipType::Battleship) >= 30);
    }
}
