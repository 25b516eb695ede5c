//! Fleet missions.
//!
//! A mission owns its ships from departure until settlement and moves
//! through timestamp-driven steps:
//!
//! ```text
//! OUTBOUND --arrival--> RESOLVED --------------------return--> SETTLED
//!                    \-> HOLDING --exploration end--> RESOLVED
//! ```
//!
//! Arrival resolution runs exactly once (`arrival_processed`). A recalled
//! mission skips arrival entirely and only returns.
//!
//! ## Travel model
//!
//! ```text
//! speed    = min over ships of base_speed * (1 + drive_bonus * drive_level)
//! duration = (10 + 3500 * sqrt(10 * distance / speed)) / fleet_speed   [s]
//! fuel     = sum over ship types of max(1, ceil(count * fuel * distance / 35000))
//! ```

use nova_types::{
    Colony, Coordinates, Fleet, FleetMission, GlobalState, InboundReport, MessageBody, MissionId,
    MissionType, Notification, NotificationKind, PlanetRecord, PlanetSnapshot, PlayerState,
    ResearchLevels, ResearchType, Resources, ShipType, SpyReport, Timestamp, count_of,
    merge_counts, subtract_counts,
};
use nova_world::catalog::{GameCatalog, to_decimal};
use nova_world::{galaxy, production};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::combat::{BattleResult, CombatSide, free_cargo, plunder, resolve_battle};
use crate::error::ActionError;
use crate::expedition::{run_exploration, run_expedition};
use crate::mail;
use crate::rules::Ruleset;

// ---------------------------------------------------------------------------
// Travel
// ---------------------------------------------------------------------------

/// Speed of the slowest ship in `fleet`, boosted by drive research.
pub fn fleet_speed(catalog: &dyn GameCatalog, fleet: &Fleet, research: &ResearchLevels) -> f64 {
    fleet
        .keys()
        .map(|ship| {
            let stats = catalog.ship_stats(*ship);
            let level = f64::from(count_of(research, &stats.drive.research()));
            stats.speed * level.mul_add(stats.drive.bonus_per_level(), 1.0)
        })
        .fold(f64::INFINITY, f64::min)
}

/// One-way flight time in milliseconds.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn travel_ms(rules: &Ruleset<'_>, distance: u64, speed: f64) -> u64 {
    let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
    let secs = 3500.0f64.mul_add(
        (10.0 * distance as f64 / speed).sqrt(),
        rules.missions.base_flight_secs,
    );
    let ms = (secs * 1000.0 / rules.universe.fleet_speed.max(f64::MIN_POSITIVE)).ceil();
    if ms.is_finite() && ms >= 1.0 { ms as u64 } else { 1 }
}

/// Deuterium burned by a one-way flight.
#[allow(clippy::cast_precision_loss)]
pub fn fuel_cost(rules: &Ruleset<'_>, fleet: &Fleet, distance: u64) -> Decimal {
    let reference = rules.missions.fuel_reference_distance.max(1.0);
    fleet
        .iter()
        .map(|(ship, count)| {
            let fuel = rules.catalog.ship_stats(*ship).fuel;
            let burn = (f64::from(*count) * fuel * distance as f64 / reference).ceil();
            to_decimal(burn).max(Decimal::ONE)
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Concurrent expeditions allowed at an astrophysics level.
pub const fn expedition_limit(astrophysics: u32) -> u32 {
    astrophysics.isqrt().saturating_add(1)
}

/// Colonies (founded plus in flight) allowed at an astrophysics level.
pub const fn colony_limit(astrophysics: u32) -> u32 {
    astrophysics.saturating_add(1) / 2
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// The next thing that happens to a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissionStep {
    /// The fleet reaches its target.
    Arrival,
    /// An exploration hold ends.
    ExplorationEnd,
    /// The fleet is back home.
    Return,
}

/// When and what the next step of `mission` is.
pub fn next_step(mission: &FleetMission) -> (Timestamp, MissionStep) {
    if mission.recalled {
        return (mission.return_time, MissionStep::Return);
    }
    if !mission.arrival_processed {
        return (mission.arrival_time, MissionStep::Arrival);
    }
    match mission.exploration_end_time {
        Some(end) if !mission.exploration_processed => (end, MissionStep::ExplorationEnd),
        _ => (mission.return_time, MissionStep::Return),
    }
}

fn take_copy(state: &PlayerState, id: MissionId) -> Option<FleetMission> {
    state.missions.iter().find(|m| m.id == id).cloned()
}

fn store(state: &mut PlayerState, mission: FleetMission) {
    if let Some(slot) = state.missions.iter_mut().find(|m| m.id == mission.id) {
        *slot = mission;
    }
}

// ---------------------------------------------------------------------------
// Dispatch and recall
// ---------------------------------------------------------------------------

fn in_flight(state: &PlayerState, mission_type: MissionType) -> u32 {
    let n = state
        .missions
        .iter()
        .filter(|m| m.mission_type == mission_type && !m.recalled)
        .count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Validate and launch a fleet. Nothing is changed when an error is
/// returned.
#[allow(clippy::too_many_arguments)]
pub fn send_fleet<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &GlobalState,
    mut fleet: Fleet,
    target: Coordinates,
    mission_type: MissionType,
    now: Timestamp,
    rng: &mut R,
) -> Result<Notification, ActionError> {
    fleet.retain(|_, count| *count > 0);
    if fleet.is_empty() {
        return Err(ActionError::composition("no ships selected"));
    }
    for (ship, count) in &fleet {
        let have = count_of(&state.fleet, ship);
        if have < *count {
            return Err(ActionError::composition(format!(
                "requested {count} {ship:?} but only {have} at home"
            )));
        }
    }
    if !galaxy::in_range(rules.universe, &target) {
        return Err(ActionError::composition(format!("{target} is outside the universe")));
    }

    let owned_by_me = global.planets.get(&target).is_some_and(|r| r.owner == state.id);
    let has = |ship: ShipType| count_of(&fleet, &ship) > 0;
    let astrophysics = state.research_level(ResearchType::Astrophysics);
    match mission_type {
        MissionType::Attack if owned_by_me => {
            return Err(ActionError::composition("cannot attack your own planet"));
        }
        MissionType::Spy if !has(ShipType::EspionageProbe) => {
            return Err(ActionError::composition("spy missions need an espionage probe"));
        }
        MissionType::Harvest if !has(ShipType::Recycler) => {
            return Err(ActionError::composition("harvest missions need a recycler"));
        }
        MissionType::Colonize => {
            if !has(ShipType::ColonyShip) {
                return Err(ActionError::composition("colonization needs a colony ship"));
            }
            if !galaxy::is_free(rules.universe, global, &target) {
                return Err(ActionError::TargetOccupied(target));
            }
            let limit = colony_limit(astrophysics);
            let used = u32::try_from(state.colonies.len())
                .unwrap_or(u32::MAX)
                .saturating_add(in_flight(state, MissionType::Colonize));
            if used >= limit {
                return Err(ActionError::MissionLimitExceeded {
                    mission_type,
                    limit,
                });
            }
        }
        MissionType::Expedition => {
            let limit = expedition_limit(astrophysics);
            if in_flight(state, MissionType::Expedition) >= limit {
                return Err(ActionError::MissionLimitExceeded {
                    mission_type,
                    limit,
                });
            }
        }
        _ => {}
    }

    let distance = state.home.distance_to(&target);
    let fuel = fuel_cost(rules, &fleet, distance);
    let fuel_bill = Resources::new(Decimal::ZERO, Decimal::ZERO, fuel);
    let Some(remaining) = state.resources.checked_minus(&fuel_bill) else {
        return Err(ActionError::InsufficientResources {
            needed: fuel_bill,
            available: state.resources,
        });
    };

    // Validation complete; mutate.
    let leg = travel_ms(rules, distance, fleet_speed(rules.catalog, &fleet, &state.research));
    let arrival_time = now.saturating_add(leg);
    let hold = if mission_type == MissionType::Explore {
        rules.missions.exploration_hold_secs.saturating_mul(1000)
    } else {
        0
    };
    subtract_counts(&mut state.fleet, &fleet);
    state.resources = remaining;
    let mission = FleetMission {
        id: MissionId::from_u128(rng.random()),
        mission_type,
        fleet,
        origin: state.home,
        target,
        start_time: now,
        arrival_time,
        return_time: arrival_time.saturating_add(hold).saturating_add(leg),
        exploration_end_time: None,
        arrival_processed: false,
        exploration_processed: false,
        recalled: false,
        loot: Resources::ZERO,
        loot_credits: Decimal::ZERO,
    };
    debug!(id = %mission.id, ?mission_type, %target, arrival_time, %fuel, "fleet dispatched");
    state.missions.push(mission);

    Ok(Notification::new(
        now,
        NotificationKind::FleetDispatched,
        format!("{mission_type:?} fleet dispatched to {target}"),
    ))
}

/// Turn an outbound fleet around.
pub fn recall_fleet(
    state: &mut PlayerState,
    id: MissionId,
    now: Timestamp,
) -> Result<Notification, ActionError> {
    let Some(mission) = state.missions.iter_mut().find(|m| m.id == id) else {
        return Err(ActionError::unknown(format!("no mission {id}")));
    };
    if mission.recalled || mission.arrival_processed || now >= mission.arrival_time {
        return Err(ActionError::composition("the fleet can no longer be recalled"));
    }
    let flown = now.saturating_sub(mission.start_time);
    mission.recalled = true;
    mission.exploration_end_time = None;
    mission.return_time = now.saturating_add(flown);
    Ok(Notification::new(
        now,
        NotificationKind::FleetReturned,
        format!("Fleet to {} recalled, home at {}", mission.target, mission.return_time),
    ))
}

// ---------------------------------------------------------------------------
// Arrival
// ---------------------------------------------------------------------------

/// Resolve a mission's arrival at its target.
pub fn resolve_arrival<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    id: MissionId,
    rng: &mut R,
) -> Vec<Notification> {
    let Some(mut mission) = take_copy(state, id) else {
        warn!(%id, "arrival for unknown mission skipped");
        return Vec::new();
    };
    if mission.arrival_processed || mission.recalled {
        warn!(%id, "arrival already handled");
        return Vec::new();
    }
    let at = mission.arrival_time;
    let mut notes = vec![Notification::new(
        at,
        NotificationKind::FleetArrived,
        format!("{:?} fleet arrived at {}", mission.mission_type, mission.target),
    )];

    match mission.mission_type {
        MissionType::Attack => arrive_attack(rules, state, global, &mut mission, rng, &mut notes),
        MissionType::Spy => arrive_spy(rules, state, global, &mission, rng, &mut notes),
        MissionType::Harvest => {
            let cargo = free_cargo(rules.catalog, &mission.fleet, &mission.loot);
            let taken = galaxy::harvest_debris(global, &mission.target, cargo);
            mission.loot = mission
                .loot
                .plus(&Resources::new(taken.metal, taken.crystal, Decimal::ZERO));
            post(rules, state, rng, at, MessageBody::Harvest {
                target: mission.target,
                metal: taken.metal,
                crystal: taken.crystal,
            });
            notes.push(Notification::new(
                at,
                NotificationKind::Harvest,
                format!("Harvested {} metal and {} crystal", taken.metal, taken.crystal),
            ));
        }
        MissionType::Expedition => {
            let body = run_expedition(rules, &mut mission, rng);
            if let MessageBody::Expedition { outcome, .. } = &body {
                notes.push(Notification::new(
                    at,
                    NotificationKind::Discovery,
                    format!("Expedition outcome: {outcome:?}"),
                ));
            }
            post(rules, state, rng, at, body);
        }
        MissionType::Colonize => {
            arrive_colonize(rules, state, global, &mut mission, rng, &mut notes);
        }
        MissionType::Explore => {
            let leg = mission.arrival_time.saturating_sub(mission.start_time);
            let end = at.saturating_add(rules.missions.exploration_hold_secs.saturating_mul(1000));
            mission.exploration_end_time = Some(end);
            mission.return_time = end.saturating_add(leg);
        }
    }

    mission.arrival_processed = true;
    store(state, mission);
    notes
}

fn post<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    rng: &mut R,
    at: Timestamp,
    body: MessageBody,
) {
    mail::post(state, rules.economy.message_cap, rng, at, body);
}

/// Debris, mission survivors and loot shared by every battle outcome.
fn settle_battle(
    global: &mut GlobalState,
    mission: &mut FleetMission,
    result: &BattleResult,
    loot: Resources,
) {
    galaxy::add_debris(global, mission.target, result.debris.metal, result.debris.crystal);
    mission.fleet.clone_from(&result.attacker_survivors);
    mission.loot = mission.loot.plus(&loot);
}

fn arrive_attack<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    mission: &mut FleetMission,
    rng: &mut R,
    notes: &mut Vec<Notification>,
) {
    let at = mission.arrival_time;
    let target = mission.target;
    let attacker = CombatSide::player_fleet(state, mission.fleet.clone());

    let report = if let Some(record) = global.planets.get(&target).cloned() {
        if record.owner == state.id {
            notes.push(Notification::new(at, NotificationKind::Battle, "No battle at own planet"));
            return;
        }
        let snapshot = record.snapshot.clone().unwrap_or_default();
        let defender = CombatSide {
            name: record.owner_name.clone(),
            fleet: snapshot.fleet.clone(),
            defenses: snapshot.defenses.clone(),
            research: snapshot.research.clone(),
            ship_levels: snapshot.ship_levels.clone(),
            ..CombatSide::default()
        };
        let result = resolve_battle(rules.catalog, rules.combat, &attacker, &defender);
        let loot = loot_for(rules, &result, mission, &snapshot.resources, &snapshot.capacity);
        settle_battle(global, mission, &result, loot);
        let report = result.report(target, &state.name, &record.owner_name, loot);

        if let Some(snap) = global.planets.get_mut(&target).and_then(|r| r.snapshot.as_mut()) {
            snap.fleet.clone_from(&result.defender_fleet_survivors);
            snap.defenses.clone_from(&result.defender_defense_survivors);
            snap.resources = snap.resources.minus_floored(&loot);
        }
        global.inbox.entry(record.owner).or_default().push(InboundReport::Attacked {
            at,
            ship_losses: result.defender_ship_losses,
            defense_losses: result.defender_defense_losses,
            stolen: loot,
            report: report.clone(),
        });
        report
    } else if galaxy::ensure_npc(rules.universe, global, target, at) {
        let Some(npc) = global.npcs.get(&target).cloned() else {
            return;
        };
        let defender = CombatSide {
            name: npc.name.clone(),
            fleet: npc.fleet.clone(),
            defenses: npc.defenses.clone(),
            research: npc.research.clone(),
            ..CombatSide::default()
        };
        let result = resolve_battle(rules.catalog, rules.combat, &attacker, &defender);
        let capacity = production::capacity(rules.catalog, &npc.buildings);
        let loot = loot_for(rules, &result, mission, &npc.resources, &capacity);
        settle_battle(global, mission, &result, loot);
        if let Some(npc) = global.npcs.get_mut(&target) {
            npc.fleet.clone_from(&result.defender_fleet_survivors);
            npc.defenses.clone_from(&result.defender_defense_survivors);
            npc.resources = npc.resources.minus_floored(&loot);
        }
        result.report(target, &state.name, &npc.name, loot)
    } else {
        let result = resolve_battle(rules.catalog, rules.combat, &attacker, &CombatSide::default());
        result.report(target, &state.name, "nobody", Resources::ZERO)
    };

    debug!(%target, outcome = ?report.outcome, "attack resolved");
    notes.push(Notification::new(
        at,
        NotificationKind::Battle,
        format!("Battle at {target}: {:?}", report.outcome),
    ));
    post(rules, state, rng, at, MessageBody::Battle(report));
}

fn loot_for(
    rules: &Ruleset<'_>,
    result: &BattleResult,
    mission: &FleetMission,
    stock: &Resources,
    capacity: &Resources,
) -> Resources {
    if result.outcome != nova_types::BattleOutcome::AttackerWins {
        return Resources::ZERO;
    }
    let cargo = free_cargo(rules.catalog, &result.attacker_survivors, &mission.loot);
    plunder(rules.combat, rules.economy.protected_fraction, stock, capacity, cargo)
}

fn snapshot_report(target: Coordinates, owner: Option<String>, snap: &PlanetSnapshot) -> SpyReport {
    SpyReport {
        target,
        owner,
        resources: snap.resources,
        fleet: snap.fleet.clone(),
        defenses: snap.defenses.clone(),
        buildings: snap.buildings.clone(),
        research: snap.research.clone(),
    }
}

fn arrive_spy<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    mission: &FleetMission,
    rng: &mut R,
    notes: &mut Vec<Notification>,
) {
    let at = mission.arrival_time;
    let target = mission.target;
    let report = if let Some(record) = global.planets.get(&target).cloned() {
        if record.owner != state.id && record.snapshot.is_some() {
            global.inbox.entry(record.owner).or_default().push(InboundReport::Spied {
                at,
                from: state.home,
                by: state.name.clone(),
            });
        }
        snapshot_report(
            target,
            Some(record.owner_name.clone()),
            &record.snapshot.unwrap_or_default(),
        )
    } else if galaxy::ensure_npc(rules.universe, global, target, at) {
        global.npcs.get(&target).map_or_else(
            || snapshot_report(target, None, &PlanetSnapshot::default()),
            |npc| SpyReport {
                target,
                owner: Some(npc.name.clone()),
                resources: npc.resources,
                fleet: npc.fleet.clone(),
                defenses: npc.defenses.clone(),
                buildings: npc.buildings.clone(),
                research: npc.research.clone(),
            },
        )
    } else {
        snapshot_report(target, None, &PlanetSnapshot::default())
    };
    notes.push(Notification::new(
        at,
        NotificationKind::Espionage,
        format!("Spy report from {target}"),
    ));
    post(rules, state, rng, at, MessageBody::Spy(report));
}

fn arrive_colonize<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    mission: &mut FleetMission,
    rng: &mut R,
    notes: &mut Vec<Notification>,
) {
    let at = mission.arrival_time;
    let target = mission.target;
    let success = galaxy::is_free(rules.universe, global, &target)
        && count_of(&mission.fleet, &ShipType::ColonyShip) > 0;
    if success {
        state.colonies.push(Colony {
            coords: target,
            founded_at: at,
        });
        global.planets.insert(
            target,
            PlanetRecord {
                owner: state.id,
                owner_name: state.name.clone(),
                is_home: false,
                snapshot: None,
            },
        );
        let mut consumed = Fleet::new();
        consumed.insert(ShipType::ColonyShip, 1);
        subtract_counts(&mut mission.fleet, &consumed);
        mission.return_time = at;
    }
    notes.push(Notification::new(
        at,
        NotificationKind::Colonization,
        if success {
            format!("Colony founded at {target}")
        } else {
            format!("Colonization of {target} failed, the slot is taken")
        },
    ));
    post(rules, state, rng, at, MessageBody::Colonization { target, success });
}

// ---------------------------------------------------------------------------
// Exploration and return
// ---------------------------------------------------------------------------

/// Resolve the end of an exploration hold.
pub fn resolve_exploration<R: Rng>(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    id: MissionId,
    rng: &mut R,
) -> Vec<Notification> {
    let Some(mut mission) = take_copy(state, id) else {
        warn!(%id, "exploration end for unknown mission skipped");
        return Vec::new();
    };
    let Some(at) = mission.exploration_end_time else {
        warn!(%id, "mission has no exploration hold");
        return Vec::new();
    };
    if mission.exploration_processed || mission.recalled {
        return Vec::new();
    }
    let side = CombatSide::player_fleet(state, Fleet::new());
    let result = run_exploration(rules, &side, &mut mission, rng);
    if let Some(boost) = result.boost {
        state.inventory.push(boost);
    }
    let text = match &result.body {
        MessageBody::Exploration { outcome, .. } => format!("Exploration outcome: {outcome:?}"),
        _ => "Exploration finished".to_owned(),
    };
    post(rules, state, rng, at, result.body);
    mission.exploration_processed = true;
    store(state, mission);
    vec![Notification::new(at, NotificationKind::Discovery, text)]
}

/// Bring a mission's surviving ships and cargo home.
pub fn settle_return(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    id: MissionId,
) -> Vec<Notification> {
    let Some(idx) = state.missions.iter().position(|m| m.id == id) else {
        warn!(%id, "return for unknown mission skipped");
        return Vec::new();
    };
    let mission = state.missions.remove(idx);
    merge_counts(&mut state.fleet, &mission.fleet);
    state.resources = state.resources.plus(&mission.loot);
    state.credits = state.credits.saturating_add(mission.loot_credits);
    production::clamp_player(rules.catalog, state);
    let ships: u64 = nova_types::unit_total(&mission.fleet);
    debug!(%id, ships, "fleet returned");
    vec![Notification::new(
        mission.return_time,
        NotificationKind::FleetReturned,
        format!("{ships} ship(s) returned from {}", mission.target),
    )]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_types::{BattleOutcome, DefenseType, PlayerId};
    use nova_world::rng::seeded;

    use super::*;
    use crate::test_support::{Fixture, global_with_home, rich_player};

    fn armed_player() -> PlayerState {
        let mut state = rich_player();
        state.fleet.insert(ShipType::Battleship, 50);
        state.fleet.insert(ShipType::LargeCargo, 20);
        state.fleet.insert(ShipType::EspionageProbe, 3);
        state.fleet.insert(ShipType::Recycler, 2);
        state.fleet.insert(ShipType::ColonyShip, 1);
        state
    }

    fn free_slot(fx: &Fixture, global: &GlobalState) -> Coordinates {
        (1..=15)
            .map(|p| Coordinates::new(1, 11, p))
            .chain((1..=15).map(|p| Coordinates::new(1, 12, p)))
            .find(|c| galaxy::is_free(&fx.universe, global, c))
            .unwrap()
    }

    fn fleet(pairs: &[(ShipType, u32)]) -> Fleet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn spy_without_probe_is_rejected() {
        let fx = Fixture::default();
        let mut state = armed_player();
        let global = global_with_home(&state);
        let before = state.clone();
        let err = send_fleet(
            &fx.rules(),
            &mut state,
            &global,
            fleet(&[(ShipType::LargeCargo, 1)]),
            Coordinates::new(1, 20, 3),
            MissionType::Spy,
            0,
            &mut seeded(&[1]),
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::InvalidMissionComposition { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn dispatch_moves_ships_and_burns_fuel() {
        let fx = Fixture::default();
        let mut state = armed_player();
        let global = global_with_home(&state);
        let ships_before = state.total_ships();
        let deut_before = state.resources.deuterium;
        send_fleet(
            &fx.rules(),
            &mut state,
            &global,
            fleet(&[(ShipType::LargeCargo, 5)]),
            Coordinates::new(1, 30, 3),
            MissionType::Harvest,
            0,
            &mut seeded(&[1]),
        )
        .unwrap_err();
        send_fleet(
            &fx.rules(),
            &mut state,
            &global,
            fleet(&[(ShipType::LargeCargo, 5), (ShipType::Recycler, 1)]),
            Coordinates::new(1, 30, 3),
            MissionType::Harvest,
            0,
            &mut seeded(&[1]),
        )
        .unwrap();
        assert_eq!(state.total_ships(), ships_before);
        assert_eq!(count_of(&state.fleet, &ShipType::LargeCargo), 15);
        assert!(state.resources.deuterium < deut_before);
        let mission = state.missions.first().unwrap();
        assert!(mission.arrival_time > 0);
        assert_eq!(
            mission.return_time.saturating_sub(mission.arrival_time),
            mission.arrival_time
        );
    }

    #[test]
    fn round_trip_without_combat_conserves_fleet() {
        let fx = Fixture::default();
        let rules = fx.rules();
        let mut state = armed_player();
        let mut global = global_with_home(&state);
        let sent = fleet(&[(ShipType::EspionageProbe, 2)]);
        send_fleet(
            &rules,
            &mut state,
            &global,
            sent.clone(),
            Coordinates::new(2, 50, 8),
            MissionType::Spy,
            0,
            &mut seeded(&[2]),
        )
        .unwrap();
        let id = state.missions.first().unwrap().id;
        let total = state.total_ships();

        resolve_arrival(&rules, &mut state, &mut global, id, &mut seeded(&[3]));
        assert_eq!(state.missions.first().unwrap().fleet, sent);
        assert!(matches!(
            state.messages.last().map(|m| &m.body),
            Some(MessageBody::Spy(_))
        ));
        settle_return(&rules, &mut state, id);
        assert!(state.missions.is_empty());
        assert_eq!(state.total_ships(), total);
        assert_eq!(count_of(&state.fleet, &ShipType::EspionageProbe), 3);
    }

    #[test]
    fn recall_reverses_flight() {
        let fx = Fixture::default();
        let mut state = armed_player();
        let global = global_with_home(&state);
        send_fleet(
            &fx.rules(),
            &mut state,
            &global,
            fleet(&[(ShipType::LargeCargo, 1)]),
            Coordinates::new(3, 90, 1),
            MissionType::Attack,
            1_000,
            &mut seeded(&[4]),
        )
        .unwrap();
        let id = state.missions.first().unwrap().id;
        recall_fleet(&mut state, id, 5_000).unwrap();
        let mission = state.missions.first().unwrap();
        assert!(mission.recalled);
        assert_eq!(mission.return_time, 9_000);
        assert_eq!(next_step(mission), (9_000, MissionStep::Return));
        assert!(recall_fleet(&mut state, id, 6_000).is_err());
    }

    #[test]
    fn colonization_claims_slot_and_consumes_ship() {
        let fx = Fixture::default();
        let rules = fx.rules();
        let mut state = armed_player();
        state.research.insert(ResearchType::Astrophysics, 1);
        let mut global = global_with_home(&state);
        let target = free_slot(&fx, &global);
        send_fleet(
            &rules,
            &mut state,
            &global,
            fleet(&[(ShipType::ColonyShip, 1), (ShipType::LargeCargo, 1)]),
            target,
            MissionType::Colonize,
            0,
            &mut seeded(&[5]),
        )
        .unwrap();
        let err = send_fleet(
            &rules,
            &mut state,
            &global,
            fleet(&[(ShipType::LargeCargo, 1)]),
            target,
            MissionType::Colonize,
            0,
            &mut seeded(&[6]),
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::InvalidMissionComposition { .. }));

        let id = state.missions.first().unwrap().id;
        resolve_arrival(&rules, &mut state, &mut global, id, &mut seeded(&[7]));
        assert_eq!(state.colonies.len(), 1);
        assert!(global.is_claimed(&target));
        let mission = state.missions.first().unwrap();
        assert_eq!(mission.return_time, mission.arrival_time);
        assert_eq!(count_of(&mission.fleet, &ShipType::ColonyShip), 0);
        assert_eq!(count_of(&mission.fleet, &ShipType::LargeCargo), 1);
    }

    #[test]
    fn colony_limit_follows_astrophysics() {
        let fx = Fixture::default();
        let mut state = armed_player();
        let global = global_with_home(&state);
        let target = free_slot(&fx, &global);
        let err = send_fleet(
            &fx.rules(),
            &mut state,
            &global,
            fleet(&[(ShipType::ColonyShip, 1)]),
            target,
            MissionType::Colonize,
            0,
            &mut seeded(&[8]),
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::MissionLimitExceeded { limit: 0, .. }));
        assert_eq!(colony_limit(3), 2);
        assert_eq!(expedition_limit(0), 1);
        assert_eq!(expedition_limit(9), 4);
    }

    #[test]
    fn attack_on_player_snapshot_queues_inbound_report() {
        let fx = Fixture::default();
        let rules = fx.rules();
        let mut state = armed_player();
        let mut global = global_with_home(&state);
        let victim = PlayerId::from_u128(77);
        let target = free_slot(&fx, &global);
        let mut defenses = nova_types::Defenses::new();
        defenses.insert(DefenseType::RocketLauncher, 20);
        global.planets.insert(target, PlanetRecord {
            owner: victim,
            owner_name: "victim".into(),
            is_home: true,
            snapshot: Some(PlanetSnapshot {
                resources: Resources::from_units(50_000, 40_000, 10_000),
                capacity: Resources::from_units(100_000, 100_000, 100_000),
                defenses,
                ..PlanetSnapshot::default()
            }),
        });

        send_fleet(
            &rules,
            &mut state,
            &global,
            fleet(&[(ShipType::Battleship, 50), (ShipType::LargeCargo, 10)]),
            target,
            MissionType::Attack,
            0,
            &mut seeded(&[9]),
        )
        .unwrap();
        let id = state.missions.first().unwrap().id;
        resolve_arrival(&rules, &mut state, &mut global, id, &mut seeded(&[10]));

        let mission = state.missions.first().unwrap();
        assert!(!mission.loot.is_zero());
        let inbox = global.inbox.get(&victim).unwrap();
        let Some(InboundReport::Attacked { report, .. }) = inbox.first() else {
            panic!("expected an attack report, got {inbox:?}");
        };
        assert_eq!(report.outcome, BattleOutcome::AttackerWins);
        assert!(global.debris.contains_key(&target));
        let snap = global.planets.get(&target).unwrap().snapshot.as_ref().unwrap();
        assert!(snap.defenses.is_empty());
        assert!(snap.resources.metal < Decimal::from(50_000));
    }

    #[test]
    fn explore_holds_then_returns() {
        let fx = Fixture::default();
        let rules = fx.rules();
        let mut state = armed_player();
        let mut global = global_with_home(&state);
        send_fleet(
            &rules,
            &mut state,
            &global,
            fleet(&[(ShipType::LargeCargo, 2)]),
            Coordinates::new(1, 40, 2),
            MissionType::Explore,
            0,
            &mut seeded(&[11]),
        )
        .unwrap();
        let id = state.missions.first().unwrap().id;
        resolve_arrival(&rules, &mut state, &mut global, id, &mut seeded(&[12]));
        let mission = state.missions.first().unwrap().clone();
        let (end, step) = next_step(&mission);
        assert_eq!(step, MissionStep::ExplorationEnd);
        assert_eq!(end, mission.arrival_time + 3_600_000);
        resolve_exploration(&rules, &mut state, id, &mut seeded(&[13]));
        let (_, step) = next_step(state.missions.first().unwrap());
        assert_eq!(step, MissionStep::Return);
    }
}
