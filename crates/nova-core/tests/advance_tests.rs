//! Catch-up scenarios spanning players, missions and NPCs.

#![allow(clippy::unwrap_used)]

use nova_agents::apply_action;
use nova_agents::npc::UNRESOLVED_RAID_GRACE_MS;
use nova_core::{
    ConservationResult, GameConfig, advance, new_player, publish_home, verify_fleet_conservation,
};
use nova_types::{
    BuildingType, Coordinates, EntityId, GlobalState, HOUR_MS, MissionId, MissionType,
    NotificationKind, NpcFleetMission, Personality, PlayerAction, PlayerId, PlayerState, QueueItem,
    QueueKind, Resources, ShipType, Timestamp, count_of,
};
use nova_world::StandardCatalog;
use nova_world::galaxy::{generate_npc, is_free};

fn start(config: &GameConfig, n: u128) -> (PlayerState, GlobalState) {
    let rules = config.ruleset(&StandardCatalog);
    let mut global = GlobalState::new(config.universe.seed);
    let state = new_player(&rules, &mut global, PlayerId::from_u128(n), "pilot", 0).unwrap();
    (state, global)
}

fn free_neighbour(config: &GameConfig, global: &GlobalState, home: Coordinates) -> Coordinates {
    (1..=config.universe.positions)
        .map(|p| Coordinates::new(home.galaxy, home.system, p))
        .chain((1..=config.universe.positions).map(|p| {
            Coordinates::new(home.galaxy, home.system % config.universe.systems + 1, p)
        }))
        .find(|c| *c != home && is_free(&config.universe, global, c))
        .unwrap()
}

#[test]
fn stock_never_exceeds_capacity_after_a_month() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let (mut state, global) = start(&config, 1);
    state.buildings.insert(BuildingType::MetalMine, 20);
    state.buildings.insert(BuildingType::CrystalMine, 18);
    state.buildings.insert(BuildingType::DeuteriumSynthesizer, 15);
    state.buildings.insert(BuildingType::SolarPlant, 25);

    let out = advance(&rules, &state, &global, 30 * 24 * HOUR_MS);
    let cap = nova_world::production::capacity(&StandardCatalog, &out.state.buildings);
    assert!(cap.covers(&out.state.resources), "{:?} over {:?}", out.state.resources, cap);
    assert!(out.state.resources.metal > state.resources.metal);
}

#[test]
fn shipyard_lane_completes_in_order() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let (mut state, global) = start(&config, 2);
    let item = |start: Timestamp, end: Timestamp| QueueItem {
        entity: EntityId::Ship(ShipType::LightFighter),
        kind: QueueKind::Ship,
        amount: 2,
        start_time: start,
        end_time: end,
    };
    state.queue = vec![item(0, 100_000), item(100_000, 200_000), item(200_000, 300_000)];

    let out = advance(&rules, &state, &global, 250_000);
    let done: Vec<Timestamp> = out
        .notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::Completed)
        .map(|n| n.at)
        .collect();
    assert_eq!(done, vec![100_000, 200_000]);
    assert_eq!(count_of(&out.state.fleet, &ShipType::LightFighter), 4);
    assert_eq!(out.state.queue.len(), 1);
    assert_eq!(out.state.queue.first().map(|i| i.end_time), Some(300_000));
}

#[test]
fn harvest_round_trip_conserves_ships() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let (mut state, global) = start(&config, 3);
    state.fleet.insert(ShipType::Recycler, 3);
    state.resources = Resources::from_units(5_000, 5_000, 5_000);
    let target = free_neighbour(&config, &global, state.home);

    let sent = apply_action(
        &rules,
        &state,
        &global,
        PlayerAction::SendFleet {
            fleet: [(ShipType::Recycler, 3)].into_iter().collect(),
            target,
            mission_type: MissionType::Harvest,
        },
        0,
    )
    .unwrap();
    let mission = sent.state.missions.first().unwrap().clone();
    assert!(sent.state.fleet.is_empty());

    let midway = advance(&rules, &sent.state, &global, mission.arrival_time);
    assert_eq!(verify_fleet_conservation(&state, &midway.state), ConservationResult::Balanced);
    assert_eq!(midway.state.missions.len(), 1);

    let home = advance(&rules, &midway.state, &midway.global, mission.return_time);
    assert!(home.state.missions.is_empty());
    assert_eq!(home.state.fleet, state.fleet);
    assert!(
        home.notifications
            .iter()
            .any(|n| n.kind == NotificationKind::FleetReturned && n.at == mission.return_time)
    );
}

#[test]
fn attack_on_player_lands_in_defender_inbox() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let mut global = GlobalState::new(config.universe.seed);
    let mut raider = new_player(&rules, &mut global, PlayerId::from_u128(4), "raider", 0).unwrap();
    let mut victim = new_player(&rules, &mut global, PlayerId::from_u128(5), "victim", 0).unwrap();

    victim.resources = Resources::from_units(8_000, 8_000, 8_000);
    publish_home(&rules, &victim, &mut global, 0);
    raider.fleet.insert(ShipType::Battleship, 20);
    raider.resources = Resources::from_units(5_000, 5_000, 9_000);

    let sent = apply_action(
        &rules,
        &raider,
        &global,
        PlayerAction::SendFleet {
            fleet: [(ShipType::Battleship, 20)].into_iter().collect(),
            target: victim.home,
            mission_type: MissionType::Attack,
        },
        0,
    )
    .unwrap();
    let mission = sent.state.missions.first().unwrap().clone();

    let raided = advance(&rules, &sent.state, &global, mission.arrival_time);
    let reports = raided.global.inbox.get(&victim.id).unwrap();
    assert_eq!(reports.len(), 1);

    let after = advance(&rules, &victim, &raided.global, mission.arrival_time);
    assert!(after.global.inbox.get(&victim.id).is_none());
    assert!(after.notifications.iter().any(|n| n.kind == NotificationKind::Battle));
    assert!(after.state.resources.metal < victim.resources.metal);
    assert_eq!(after.state.messages.len(), 1);
}

#[test]
fn npc_raid_resolves_and_returns_during_catch_up() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let (state, mut global) = start(&config, 6);
    let npc_home = free_neighbour(&config, &global, state.home);
    let npc = generate_npc(&config.universe, npc_home, 0);
    global.npcs.insert(npc_home, npc);
    let id = MissionId::from_u128(0xdead);
    global.npc_missions.push(NpcFleetMission {
        id,
        npc: npc_home,
        target_player: state.id,
        target: state.home,
        mission_type: MissionType::Attack,
        fleet: [(ShipType::Cruiser, 10)].into_iter().collect(),
        start_time: 0,
        arrival_time: HOUR_MS / 2,
        return_time: HOUR_MS,
        arrival_processed: false,
        loot: Resources::ZERO,
    });

    let out = advance(&rules, &state, &global, 3 * HOUR_MS);
    assert!(
        out.notifications
            .iter()
            .any(|n| n.kind == NotificationKind::Battle && n.at == HOUR_MS / 2)
    );
    assert!(out.global.npc_missions.iter().all(|m| m.id != id));
    let npc = out.global.npcs.get(&npc_home).unwrap();
    assert_eq!(npc.last_update, 3 * HOUR_MS);

    let again = advance(&rules, &out.state, &out.global, 3 * HOUR_MS);
    assert_eq!(again.state, out.state);
    assert_eq!(again.global, out.global);
    assert!(again.notifications.is_empty());
}

#[test]
fn bystander_catch_up_sends_forgotten_raid_home() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let mut global = GlobalState::new(config.universe.seed);
    let absent = new_player(&rules, &mut global, PlayerId::from_u128(7), "absent", 0).unwrap();
    let bystander =
        new_player(&rules, &mut global, PlayerId::from_u128(8), "bystander", 0).unwrap();
    let npc_home = free_neighbour(&config, &global, absent.home);
    let mut npc = generate_npc(&config.universe, npc_home, 0);
    npc.personality = Personality::Economic;
    npc.fleet.remove(&ShipType::Cruiser);
    global.npcs.insert(npc_home, npc);
    let id = MissionId::from_u128(0xbeef);
    global.npc_missions.push(NpcFleetMission {
        id,
        npc: npc_home,
        target_player: absent.id,
        target: absent.home,
        mission_type: MissionType::Attack,
        fleet: [(ShipType::Cruiser, 10)].into_iter().collect(),
        start_time: 0,
        arrival_time: HOUR_MS / 2,
        return_time: HOUR_MS,
        arrival_processed: false,
        loot: Resources::ZERO,
    });

    let early = advance(&rules, &bystander, &global, 2 * HOUR_MS);
    assert!(early.global.npc_missions.iter().any(|m| m.id == id));

    let later = HOUR_MS + UNRESOLVED_RAID_GRACE_MS + HOUR_MS;
    let out = advance(&rules, &early.state, &early.global, later);
    assert!(out.global.npc_missions.iter().all(|m| m.id != id));
    let npc = out.global.npcs.get(&npc_home).unwrap();
    assert_eq!(count_of(&npc.fleet, &ShipType::Cruiser), 10);
}

#[test]
fn bystander_settles_processed_npc_return() {
    let config = GameConfig::default();
    let rules = config.ruleset(&StandardCatalog);
    let mut global = GlobalState::new(config.universe.seed);
    let target = new_player(&rules, &mut global, PlayerId::from_u128(9), "target", 0).unwrap();
    let bystander =
        new_player(&rules, &mut global, PlayerId::from_u128(10), "bystander", 0).unwrap();
    let npc_home = free_neighbour(&config, &global, target.home);
    let npc = generate_npc(&config.universe, npc_home, 0);
    global.npcs.insert(npc_home, npc);
    let id = MissionId::from_u128(0xf00d);
    global.npc_missions.push(NpcFleetMission {
        id,
        npc: npc_home,
        target_player: target.id,
        target: target.home,
        mission_type: MissionType::Attack,
        fleet: [(ShipType::Cruiser, 4)].into_iter().collect(),
        start_time: 0,
        arrival_time: HOUR_MS / 4,
        return_time: HOUR_MS / 2,
        arrival_processed: true,
        loot: Resources::from_units(100, 0, 0),
    });

    let out = advance(&rules, &bystander, &global, HOUR_MS);
    assert!(out.global.npc_missions.iter().all(|m| m.id != id));
    let npc = out.global.npcs.get(&npc_home).unwrap();
    assert!(count_of(&npc.fleet, &ShipType::Cruiser) >= 4);
}
