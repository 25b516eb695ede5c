//! Event-driven offline catch-up.
//!
//! [`advance`] brings a player from `last_save_time` to `now` by jumping
//! from one pending event to the next. Production between two events is
//! accrued analytically, so a week offline costs one step per event rather
//! than one step per second.
//!
//! ## Sweep flow
//!
//! 1. Prime unscheduled world-event timers and fast-forward NPC backlogs.
//! 2. Repeatedly pick the earliest pending event at or before `now`:
//!    accrue production up to it, then resolve it. Reports other players
//!    left in the inbox are events too, keyed by when they happened.
//! 3. Accrue the tail up to `now`, stamp `last_save_time` and publish the
//!    home snapshot for other players.
//!
//! If the event budget runs out first, the sweep stops at the last
//! resolved event and stamps that instead, so the next call picks up
//! exactly where this one left off.
//!
//! Events at the same timestamp resolve in a fixed order: queue
//! completions, boost expiries, world events, NPC cycles, mission
//! arrivals, NPC arrivals, inbox reports, exploration ends, mission
//! returns, NPC returns, stale NPC missions.
//!
//! The sweep never fails. Inconsistent data is logged and skipped.

use nova_agents::missions::{self, MissionStep};
use nova_agents::{Ruleset, mail, npc, queue};
use nova_types::{
    BoostType, Coordinates, GlobalState, InboundReport, MessageBody, MissionId, Notification,
    NotificationKind, PlanetRecord, PlanetSnapshot, PlayerState, Timestamp, WorldEventKind,
    count_of,
};
use nova_world::production;
use nova_world::rng::{coord_key, seeded, tag};
use tracing::{debug, info, warn};

use crate::conservation::ship_totals;

/// Upper bound on events resolved by one call.
pub const MAX_EVENTS_PER_ADVANCE: usize = 100_000;

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Output of [`advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct Advanced {
    /// The player at `now`, or at the last resolved event if the event
    /// budget ran out.
    pub state: PlayerState,
    /// Shared state after NPC cycles, raids and publishing.
    pub global: GlobalState,
    /// Everything that happened, oldest first.
    pub notifications: Vec<Notification>,
    /// Number of events resolved.
    pub events: usize,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A pending event. Variant order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    QueueCompletion,
    BoostExpiry(BoostType),
    WorldEvent(WorldEventKind),
    NpcCycle(Coordinates),
    MissionArrival(MissionId),
    NpcMissionArrival(MissionId),
    Inbound,
    ExplorationEnd(MissionId),
    MissionReturn(MissionId),
    NpcMissionReturn(MissionId),
    StaleNpcMission(MissionId),
}

fn next_due(
    rules: &Ruleset<'_>,
    state: &PlayerState,
    global: &GlobalState,
    floor: Timestamp,
) -> Option<(Timestamp, Due)> {
    let queued = queue::next_completion(state).map(|at| (at, Due::QueueCompletion));
    let boosts = state
        .active_boosts
        .iter()
        .map(|(kind, boost)| (boost.expires_at, Due::BoostExpiry(*kind)));
    let world = rules
        .scheduler()
        .next_due(&state.events)
        .map(|(at, kind)| (at, Due::WorldEvent(kind)));
    let cycles = global
        .npcs
        .values()
        .map(|n| (npc::next_cycle_at(rules, n), Due::NpcCycle(n.coords)));
    let fleets = state.missions.iter().map(|m| {
        let (at, step) = missions::next_step(m);
        let due = match step {
            MissionStep::Arrival => Due::MissionArrival(m.id),
            MissionStep::ExplorationEnd => Due::ExplorationEnd(m.id),
            MissionStep::Return => Due::MissionReturn(m.id),
        };
        (at, due)
    });
    let inbound = global
        .inbox
        .get(&state.id)
        .and_then(|reports| reports.iter().map(InboundReport::at).min())
        .map(|at| (at.max(floor), Due::Inbound));
    // Returns are settled by whoever gets there first. Raids on other
    // players are only dropped once their target has been away too long.
    let raids = global.npc_missions.iter().map(|m| {
        if m.arrival_processed {
            (m.return_time, Due::NpcMissionReturn(m.id))
        } else if m.target_player == state.id {
            (m.arrival_time, Due::NpcMissionArrival(m.id))
        } else {
            let expiry = m.return_time.saturating_add(npc::UNRESOLVED_RAID_GRACE_MS);
            (expiry, Due::StaleNpcMission(m.id))
        }
    });

    queued
        .into_iter()
        .chain(boosts)
        .chain(world)
        .chain(cycles)
        .chain(fleets)
        .chain(inbound)
        .chain(raids)
        .min()
}

fn id_key(id: MissionId) -> u64 {
    let (hi, lo) = id.into_inner().as_u64_pair();
    hi ^ lo
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Advance `state` (and the shared galaxy) to `now`.
///
/// Idempotent: advancing the result to the same `now` again changes
/// nothing and yields no notifications. When more than
/// [`MAX_EVENTS_PER_ADVANCE`] events are due, the result stops short of
/// `now` and a further call resumes from there.
pub fn advance(
    rules: &Ruleset<'_>,
    state: &PlayerState,
    global: &GlobalState,
    now: Timestamp,
) -> Advanced {
    advance_bounded(rules, state, global, now, MAX_EVENTS_PER_ADVANCE)
}

fn advance_bounded(
    rules: &Ruleset<'_>,
    state: &PlayerState,
    global: &GlobalState,
    now: Timestamp,
    budget: usize,
) -> Advanced {
    let mut state = state.clone();
    let mut global = global.clone();
    let mut notes = Vec::new();

    let from = state.last_save_time;
    let now = if now < from {
        warn!(player = %state.id, from, now, "clock behind last save, holding at last save");
        from
    } else {
        now
    };

    let mut prime_rng = seeded(&[global.seed, state.id.seed(), from, tag::WORLD_EVENT]);
    rules.scheduler().prime(&mut state.events, from, &mut prime_rng);
    for n in global.npcs.values_mut() {
        npc::fast_forward(rules, n, now);
    }

    let speed = rules.universe.economy_speed;
    let mut cursor = from;
    let mut events = 0_usize;
    let mut exhausted = false;
    while let Some((at, due)) = next_due(rules, &state, &global, from) {
        if at > now {
            break;
        }
        if events >= budget {
            warn!(
                player = %state.id,
                at,
                stopped_at = cursor,
                "event budget exhausted, resuming on next advance"
            );
            exhausted = true;
            break;
        }
        if at > cursor {
            production::accrue_player(rules.catalog, rules.economy, speed, &mut state, cursor, at);
            cursor = at;
        }
        resolve(rules, &mut state, &mut global, at, due, now, &mut notes);
        events = events.saturating_add(1);
    }

    let reached = if exhausted {
        cursor
    } else {
        production::accrue_player(rules.catalog, rules.economy, speed, &mut state, cursor, now);
        now
    };
    state.last_save_time = reached;
    publish_home(rules, &state, &mut global, reached);

    info!(
        player = %state.id,
        from,
        now,
        reached,
        events,
        notifications = notes.len(),
        ships = ?ship_totals(&state),
        "player advanced"
    );
    Advanced {
        state,
        global,
        notifications: notes,
        events,
    }
}

fn resolve(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    at: Timestamp,
    due: Due,
    horizon: Timestamp,
    notes: &mut Vec<Notification>,
) {
    debug!(player = %state.id, at, ?due, "resolving event");
    let seed = global.seed;
    let player_key = state.id.seed();
    match due {
        Due::QueueCompletion => {
            notes.extend(queue::settle_due(state, at).into_iter().map(|(_, note)| note));
        }
        Due::BoostExpiry(kind) => {
            state.active_boosts.remove(&kind);
            notes.push(Notification::new(
                at,
                NotificationKind::Boost,
                format!("{kind:?} boost expired"),
            ));
        }
        Due::WorldEvent(kind) => {
            let mut rng = seeded(&[seed, player_key, at, tag::WORLD_EVENT, kind as u64]);
            notes.extend(rules.scheduler().apply(kind, state, at, horizon, &mut rng));
            production::clamp_player(rules.catalog, state);
        }
        Due::NpcCycle(coords) => {
            let target = npc::nearest_home(global, &coords);
            let Some(n) = global.npcs.get_mut(&coords) else {
                return;
            };
            let cycle_end = npc::next_cycle_at(rules, n);
            let mut rng = seeded(&[seed, coord_key(&coords), cycle_end, tag::NPC_CYCLE]);
            if let Some(mission) = npc::evolve_cycle(rules, n, target, &mut rng) {
                global.npc_missions.push(mission);
            }
        }
        Due::MissionArrival(id) => {
            let mut rng = seeded(&[seed, player_key, at, tag::ARRIVAL, id_key(id)]);
            notes.extend(missions::resolve_arrival(rules, state, global, id, &mut rng));
        }
        Due::NpcMissionArrival(id) => {
            let mut rng = seeded(&[seed, player_key, at, tag::ARRIVAL, id_key(id)]);
            notes.extend(npc::resolve_npc_arrival(rules, state, global, id, &mut rng));
        }
        Due::Inbound => apply_next_report(rules, state, global, at, notes),
        Due::ExplorationEnd(id) => {
            let mut rng = seeded(&[seed, player_key, at, tag::EXPLORATION, id_key(id)]);
            notes.extend(missions::resolve_exploration(rules, state, id, &mut rng));
        }
        Due::MissionReturn(id) => notes.extend(missions::settle_return(rules, state, id)),
        Due::NpcMissionReturn(id) => npc::settle_npc_return(rules, global, id),
        Due::StaleNpcMission(id) => npc::expire_unresolved(rules, global, id),
    }
}

// ---------------------------------------------------------------------------
// Cross-player state
// ---------------------------------------------------------------------------

/// Apply the oldest report in the player's inbox. Reports older than the
/// last save land at `at`, the start of the sweep.
fn apply_next_report(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    global: &mut GlobalState,
    at: Timestamp,
    notes: &mut Vec<Notification>,
) {
    let Some(reports) = global.inbox.get_mut(&state.id) else {
        return;
    };
    let oldest = reports
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| r.at())
        .map(|(idx, _)| idx);
    let Some(report) = oldest.map(|idx| reports.remove(idx)) else {
        return;
    };
    if reports.is_empty() {
        global.inbox.remove(&state.id);
    }

    let cap = rules.economy.message_cap;
    let mut rng = seeded(&[global.seed, state.id.seed(), at, tag::IDS]);
    match report {
        InboundReport::Attacked {
            ship_losses,
            defense_losses,
            stolen,
            report,
            ..
        } => {
            for (ship, lost) in &ship_losses {
                let left = count_of(&state.fleet, ship).saturating_sub(*lost);
                state.fleet.insert(*ship, left);
            }
            state.fleet.retain(|_, count| *count > 0);
            for (defense, lost) in &defense_losses {
                let left = count_of(&state.defenses, defense).saturating_sub(*lost);
                state.defenses.insert(*defense, left);
            }
            state.defenses.retain(|_, count| *count > 0);
            state.resources = state.resources.minus_floored(&stolen);
            notes.push(Notification::new(
                at,
                NotificationKind::Battle,
                format!("{} attacked your home: {:?}", report.attacker, report.outcome),
            ));
            mail::post(state, cap, &mut rng, at, MessageBody::Battle(report));
        }
        InboundReport::Spied { from, by, .. } => {
            notes.push(Notification::new(
                at,
                NotificationKind::Espionage,
                format!("{by} spied on your home from {from}"),
            ));
            mail::post(state, cap, &mut rng, at, MessageBody::EspionageEvent { from, by });
        }
    }
}

/// Publish the player's home snapshot so other players can attack and spy
/// on it.
pub fn publish_home(
    rules: &Ruleset<'_>,
    state: &PlayerState,
    global: &mut GlobalState,
    now: Timestamp,
) {
    let snapshot = PlanetSnapshot {
        resources: state.resources,
        capacity: production::capacity(rules.catalog, &state.buildings),
        fleet: state.fleet.clone(),
        defenses: state.defenses.clone(),
        buildings: state.buildings.clone(),
        research: state.research.clone(),
        ship_levels: state.ship_levels.clone(),
        taken_at: now,
    };
    let record = global.planets.entry(state.home).or_insert_with(|| PlanetRecord {
        owner: state.id,
        owner_name: state.name.clone(),
        is_home: true,
        snapshot: None,
    });
    if record.owner != state.id {
        warn!(
            player = %state.id,
            home = %state.home,
            "home slot owned by someone else, not publishing"
        );
        return;
    }
    record.snapshot = Some(snapshot);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_types::{
        ActiveBoost, BuildingType, EntityId, PlayerId, QueueItem, QueueKind, Resources,
    };
    use nova_world::StandardCatalog;

    use super::*;
    use crate::config::GameConfig;
    use crate::player::new_player;

    fn setup(config: &GameConfig) -> (PlayerState, GlobalState) {
        let rules = config.ruleset(&StandardCatalog);
        let mut global = GlobalState::new(config.universe.seed);
        let state = new_player(&rules, &mut global, PlayerId::from_u128(10), "sweeper", 0).unwrap();
        (state, global)
    }

    fn mine_item(start: Timestamp, end: Timestamp) -> QueueItem {
        QueueItem {
            entity: EntityId::Building(BuildingType::MetalMine),
            kind: QueueKind::Building,
            amount: 1,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn ten_minute_build_completes_once() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, global) = setup(&config);
        state.queue.push(mine_item(0, 600_000));

        let out = advance(&rules, &state, &global, 1_000_000);
        let completed: Vec<_> = out
            .notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::Completed)
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed.first().unwrap().at, 600_000);
        assert_eq!(out.state.building_level(BuildingType::MetalMine), 1);
        assert!(out.state.queue.is_empty());
        assert_eq!(out.state.last_save_time, 1_000_000);
    }

    #[test]
    fn production_accrues_piecewise_around_completion() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, global) = setup(&config);
        state.resources = Resources::ZERO;
        state.buildings.insert(BuildingType::SolarPlant, 5);

        let idle = advance(&rules, &state, &global, HOUR);
        state.queue.push(mine_item(0, HOUR / 2));
        let building = advance(&rules, &state, &global, HOUR);
        assert!(building.state.resources.metal > idle.state.resources.metal);
        assert_eq!(idle.state.resources.crystal, building.state.resources.crystal);
    }

    #[test]
    fn second_advance_to_same_instant_is_a_no_op() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, global) = setup(&config);
        state.queue.push(mine_item(0, 600_000));
        let week = 7 * 24 * HOUR;

        let first = advance(&rules, &state, &global, week);
        let second = advance(&rules, &first.state, &first.global, week);
        assert_eq!(second.state, first.state);
        assert_eq!(second.global, first.global);
        assert!(second.notifications.is_empty());
        assert_eq!(second.events, 0);
    }

    #[test]
    fn stale_clock_holds_at_last_save() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, global) = setup(&config);
        state.last_save_time = 5_000;
        let out = advance(&rules, &state, &global, 1_000);
        assert_eq!(out.state.last_save_time, 5_000);
        assert_eq!(out.state.resources, state.resources);
    }

    #[test]
    fn exhausted_budget_resumes_where_it_stopped() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, global) = setup(&config);
        state.buildings.insert(BuildingType::SolarPlant, 5);
        state.queue = vec![
            mine_item(0, HOUR),
            mine_item(HOUR, 2 * HOUR),
            mine_item(2 * HOUR, 3 * HOUR),
        ];
        let now = 4 * HOUR;

        let full = advance(&rules, &state, &global, now);

        // Each hour holds a completion and a black-market payout.
        let first = advance_bounded(&rules, &state, &global, now, 2);
        assert_eq!(first.events, 2);
        assert_eq!(first.state.last_save_time, HOUR);
        assert_eq!(first.state.queue.len(), 2);

        let mut current = first;
        let mut completed: Vec<Timestamp> = Vec::new();
        for _ in 0..10 {
            completed.extend(
                current
                    .notifications
                    .iter()
                    .filter(|n| n.kind == NotificationKind::Completed)
                    .map(|n| n.at),
            );
            if current.state.last_save_time == now {
                break;
            }
            current = advance_bounded(&rules, &current.state, &current.global, now, 2);
        }

        assert_eq!(current.state, full.state);
        assert_eq!(completed, vec![HOUR, 2 * HOUR, 3 * HOUR]);
        let settled = advance_bounded(&rules, &current.state, &current.global, now, 2);
        assert_eq!(settled.events, 0);
        assert_eq!(settled.state, current.state);
    }

    #[test]
    fn inbox_reports_resolve_at_their_own_time() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, mut global) = setup(&config);
        state.queue.push(mine_item(0, HOUR));
        global.inbox.insert(state.id, vec![
            InboundReport::Spied {
                at: 5 * HOUR,
                from: Coordinates::new(1, 1, 1),
                by: "watcher".to_owned(),
            },
            InboundReport::Spied {
                at: 8 * HOUR,
                from: Coordinates::new(1, 1, 2),
                by: "latecomer".to_owned(),
            },
        ]);

        let out = advance(&rules, &state, &global, 6 * HOUR);
        let times: Vec<Timestamp> = out.notifications.iter().map(|n| n.at).collect();
        assert!(times.windows(2).all(|w| w.first() <= w.last()), "{times:?}");
        let spied: Vec<Timestamp> = out
            .notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::Espionage)
            .map(|n| n.at)
            .collect();
        assert_eq!(spied, vec![5 * HOUR]);
        assert_eq!(out.global.inbox.get(&state.id).map(Vec::len), Some(1));
    }

    #[test]
    fn stale_inbox_report_lands_at_sweep_start() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, mut global) = setup(&config);
        state.last_save_time = 2 * HOUR;
        global.inbox.insert(state.id, vec![InboundReport::Spied {
            at: HOUR,
            from: Coordinates::new(1, 1, 1),
            by: "watcher".to_owned(),
        }]);

        let out = advance(&rules, &state, &global, 3 * HOUR);
        let note = out.notifications.first().unwrap();
        assert_eq!(note.kind, NotificationKind::Espionage);
        assert_eq!(note.at, 2 * HOUR);
        assert!(out.global.inbox.get(&state.id).is_none());
    }

    #[test]
    fn boosts_expiring_together_each_report() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let (mut state, global) = setup(&config);
        for kind in [BoostType::Production, BoostType::Combat] {
            state.active_boosts.insert(kind, ActiveBoost {
                level: 1,
                expires_at: HOUR,
            });
        }

        let out = advance(&rules, &state, &global, 2 * HOUR);
        let expired = out
            .notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::Boost && n.at == HOUR)
            .count();
        assert_eq!(expired, 2);
        assert!(out.state.active_boosts.is_empty());
    }

    const HOUR: Timestamp = nova_types::HOUR_MS;
}
