//! Construction queues.
//!
//! Two independent lanes run side by side: construction (buildings,
//! research, ship upgrades) and shipyard (ships, defenses). Items in a lane
//! complete strictly in insertion order; an item starts when its
//! predecessor ends.
//!
//! ## Enqueue flow
//!
//! 1. Check the entity fits the queue kind
//! 2. Reject if the lane is at capacity
//! 3. Resolve the target level (counting already-queued levels) or amount
//! 4. Check prerequisites
//! 5. Price the item, applying a one-shot cost reduction
//! 6. Debit and append

use nova_types::{
    BoostType, EntityId, Notification, NotificationKind, PlayerState, QueueItem, QueueKind,
    QueueLane, Resources, Timestamp, count_of,
};
use nova_world::catalog::{requirements_met, to_decimal};
use tracing::debug;

use crate::error::ActionError;
use crate::rules::Ruleset;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lane capacity when no queue-capacity boost is active.
pub const DEFAULT_LANE_CAPACITY: u32 = 1;

/// Cost reduction per level of a cost-reduction boost.
pub const COST_REDUCTION_PER_LEVEL: f64 = 0.1;

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Number of items a lane may hold.
pub fn lane_capacity(state: &PlayerState) -> u32 {
    state.boost_level(BoostType::QueueCapacity).max(DEFAULT_LANE_CAPACITY)
}

/// Current level of a leveled entity (ship upgrades read the upgrade tier).
pub fn current_level(state: &PlayerState, entity: EntityId, kind: QueueKind) -> u32 {
    match (entity, kind) {
        (EntityId::Building(b), _) => state.building_level(b),
        (EntityId::Research(r), _) => state.research_level(r),
        (EntityId::Ship(s), QueueKind::ShipUpgrade) => state.ship_level(s),
        (EntityId::Ship(s), _) => count_of(&state.fleet, &s),
        (EntityId::Defense(d), _) => count_of(&state.defenses, &d),
    }
}

/// The earliest end time among lane heads, if anything is queued.
pub fn next_completion(state: &PlayerState) -> Option<Timestamp> {
    QueueLane::ALL
        .into_iter()
        .filter_map(|lane| state.lane_items(lane).next().map(|item| item.end_time))
        .min()
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// Validate and append a queue item, debiting its cost.
///
/// Nothing is changed when an error is returned.
pub fn enqueue(
    rules: &Ruleset<'_>,
    state: &mut PlayerState,
    entity: EntityId,
    kind: QueueKind,
    amount: u32,
    now: Timestamp,
) -> Result<Notification, ActionError> {
    if !kind.accepts(entity) {
        return Err(ActionError::unknown(format!(
            "{entity:?} cannot be queued as {kind:?}"
        )));
    }
    if !kind.is_leveled() && amount == 0 {
        return Err(ActionError::InvalidAmount {
            reason: "amount must be at least 1".to_owned(),
        });
    }

    let lane = kind.lane();
    let capacity = lane_capacity(state);
    let in_lane = state.lane_items(lane).count();
    if u32::try_from(in_lane).unwrap_or(u32::MAX) >= capacity {
        return Err(ActionError::QueueFull { lane, capacity });
    }

    let target = if kind.is_leveled() {
        let queued = state
            .queue
            .iter()
            .filter(|item| item.entity == entity && item.kind == kind)
            .count();
        current_level(state, entity, kind)
            .saturating_add(u32::try_from(queued).unwrap_or(u32::MAX))
            .saturating_add(1)
    } else {
        amount
    };

    if kind != QueueKind::ShipUpgrade {
        let missing: Vec<_> = rules
            .catalog
            .requirements(entity)
            .into_iter()
            .filter(|req| !requirements_met(&[*req], &state.buildings, &state.research))
            .collect();
        if !missing.is_empty() {
            return Err(ActionError::RequirementsNotMet { entity, missing });
        }
    }

    let (base_cost, secs) = match (entity, kind) {
        (EntityId::Ship(ship), QueueKind::ShipUpgrade) => (
            rules.catalog.upgrade_cost(ship, target),
            rules.catalog.upgrade_time_secs(ship, target, &state.buildings),
        ),
        _ => (
            rules.catalog.cost(entity, target),
            rules.catalog.build_time_secs(entity, target, &state.buildings),
        ),
    };

    let reduction_level = if matches!(kind, QueueKind::Building | QueueKind::Research) {
        state.boost_level(BoostType::CostReduction)
    } else {
        0
    };
    let cost = discounted(&base_cost, reduction_level);

    let Some(remaining) = state.resources.checked_minus(&cost) else {
        return Err(ActionError::InsufficientResources {
            needed: cost,
            available: state.resources,
        });
    };

    // Validation complete; mutate.
    state.resources = remaining;
    if reduction_level > 0 {
        state.active_boosts.remove(&BoostType::CostReduction);
    }
    let start_time = state
        .lane_items(lane)
        .map(|item| item.end_time)
        .max()
        .map_or(now, |tail| tail.max(now));
    let end_time = start_time.saturating_add(rules.build_duration_ms(secs));
    state.queue.push(QueueItem {
        entity,
        kind,
        amount: target,
        start_time,
        end_time,
    });
    debug!(?entity, ?kind, target, start_time, end_time, "queued");

    Ok(Notification::new(
        now,
        NotificationKind::Queued,
        format!("{} queued", describe(entity, kind, target)),
    ))
}

fn discounted(cost: &Resources, level: u32) -> Resources {
    if level == 0 {
        return *cost;
    }
    let factor = (1.0 - COST_REDUCTION_PER_LEVEL * f64::from(level)).max(0.0);
    cost.scaled(to_decimal(factor)).floored()
}

fn describe(entity: EntityId, kind: QueueKind, target: u32) -> String {
    match (entity, kind) {
        (EntityId::Building(b), _) => format!("{b:?} level {target}"),
        (EntityId::Research(r), _) => format!("{r:?} level {target}"),
        (EntityId::Ship(s), QueueKind::ShipUpgrade) => format!("{s:?} upgrade tier {target}"),
        (EntityId::Ship(s), _) => format!("{target} x {s:?}"),
        (EntityId::Defense(d), _) => format!("{target} x {d:?}"),
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Apply a finished item's effect to the player.
pub fn apply_completion(state: &mut PlayerState, item: &QueueItem) {
    match (item.entity, item.kind) {
        (EntityId::Building(b), _) => {
            let level = state.building_level(b).saturating_add(1);
            state.buildings.insert(b, level);
        }
        (EntityId::Research(r), _) => {
            let level = state.research_level(r).saturating_add(1);
            state.research.insert(r, level);
        }
        (EntityId::Ship(s), QueueKind::ShipUpgrade) => {
            let tier = state.ship_level(s).saturating_add(1);
            state.ship_levels.insert(s, tier);
        }
        (EntityId::Ship(s), _) => {
            let count = count_of(&state.fleet, &s).saturating_add(item.amount);
            state.fleet.insert(s, count);
        }
        (EntityId::Defense(d), _) => {
            let count = count_of(&state.defenses, &d).saturating_add(item.amount);
            state.defenses.insert(d, count);
        }
    }
}

/// Complete every item whose end time is at or before `up_to`.
///
/// Items complete in ascending end time. Within a lane, an item never
/// completes before its predecessor. Returns the completed items with one
/// notification each.
pub fn settle_due(state: &mut PlayerState, up_to: Timestamp) -> Vec<(QueueItem, Notification)> {
    let mut completed = Vec::new();
    loop {
        let head = QueueLane::ALL
            .into_iter()
            .filter_map(|lane| {
                state
                    .queue
                    .iter()
                    .enumerate()
                    .find(|(_, item)| item.lane() == lane)
            })
            .filter(|(_, item)| item.end_time <= up_to)
            .min_by_key(|(_, item)| item.end_time)
            .map(|(idx, _)| idx);
        let Some(idx) = head else {
            break;
        };
        let item = state.queue.remove(idx);
        apply_completion(state, &item);
        debug!(entity = ?item.entity, end_time = item.end_time, "queue item completed");
        let note = Notification::new(
            item.end_time,
            NotificationKind::Completed,
            format!("{} completed", describe(item.entity, item.kind, item.amount)),
        );
        completed.push((item, note));
    }
    completed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_types::{ActiveBoost, BuildingType, ResearchType, ShipType};

    use super::*;
    use crate::test_support::{Fixture, rich_player};

    fn building(b: BuildingType) -> EntityId {
        EntityId::Building(b)
    }

    #[test]
    fn second_build_is_rejected_without_debit() {
        let fx = Fixture::default();
        let mut state = rich_player();
        let mine = building(BuildingType::MetalMine);
        enqueue(&fx.rules(), &mut state, mine, QueueKind::Building, 1, 0).unwrap();
        let after_first = state.resources;

        let err = enqueue(
            &fx.rules(),
            &mut state,
            building(BuildingType::CrystalMine),
            QueueKind::Building,
            1,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::QueueFull { capacity: 1, .. }));
        assert_eq!(state.resources, after_first);
        assert_eq!(state.queue.len(), 1);
    }

    #[test]
    fn lanes_are_independent() {
        let fx = Fixture::default();
        let mut state = rich_player();
        state.buildings.insert(BuildingType::Shipyard, 2);
        state.research.insert(ResearchType::CombustionDrive, 1);
        let mine = building(BuildingType::MetalMine);
        let fighter = EntityId::Ship(ShipType::LightFighter);
        enqueue(&fx.rules(), &mut state, mine, QueueKind::Building, 1, 0).unwrap();
        enqueue(&fx.rules(), &mut state, fighter, QueueKind::Ship, 5, 0).unwrap();
        assert_eq!(state.queue.len(), 2);
    }

    #[test]
    fn settle_is_fifo_and_stops_at_first_pending() {
        let fx = Fixture::default();
        let mut state = rich_player();
        state.active_boosts.insert(
            BoostType::QueueCapacity,
            ActiveBoost {
                level: 3,
                expires_at: u64::MAX,
            },
        );
        for b in [BuildingType::MetalMine, BuildingType::CrystalMine, BuildingType::SolarPlant] {
            enqueue(&fx.rules(), &mut state, building(b), QueueKind::Building, 1, 0).unwrap();
        }
        let ends: Vec<_> = state.queue.iter().map(|i| i.end_time).collect();
        assert!(ends.windows(2).all(|w| w[0] < w[1]));
        let second_end = *ends.get(1).unwrap();

        let done = settle_due(&mut state, second_end);
        let entities: Vec<_> = done.iter().map(|(item, _)| item.entity).collect();
        assert_eq!(
            entities,
            vec![building(BuildingType::MetalMine), building(BuildingType::CrystalMine)]
        );
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.building_level(BuildingType::SolarPlant), 0);
        assert!(done.iter().all(|(_, n)| n.kind == NotificationKind::Completed));
    }

    #[test]
    fn queued_levels_count_toward_target() {
        let fx = Fixture::default();
        let mut state = rich_player();
        state.active_boosts.insert(
            BoostType::QueueCapacity,
            ActiveBoost {
                level: 2,
                expires_at: u64::MAX,
            },
        );
        let mine = building(BuildingType::MetalMine);
        enqueue(&fx.rules(), &mut state, mine, QueueKind::Building, 1, 0).unwrap();
        let before = state.resources;
        enqueue(&fx.rules(), &mut state, mine, QueueKind::Building, 1, 0).unwrap();
        let level_two = fx.rules().catalog.cost(mine, 2);
        assert_eq!(before.checked_minus(&level_two), Some(state.resources));

        settle_due(&mut state, u64::MAX);
        assert_eq!(state.building_level(BuildingType::MetalMine), 2);
    }

    #[test]
    fn cost_reduction_is_consumed() {
        let fx = Fixture::default();
        let mut state = rich_player();
        state.active_boosts.insert(
            BoostType::CostReduction,
            ActiveBoost {
                level: 5,
                expires_at: u64::MAX,
            },
        );
        let lab = building(BuildingType::ResearchLab);
        let full = fx.rules().catalog.cost(lab, 1);
        let before = state.resources;
        enqueue(&fx.rules(), &mut state, lab, QueueKind::Building, 1, 0).unwrap();
        let paid = before.checked_minus(&state.resources).unwrap();
        assert_eq!(paid, full.scaled(rust_decimal::Decimal::new(5, 1)).floored());
        assert!(!state.active_boosts.contains_key(&BoostType::CostReduction));
    }

    #[test]
    fn missing_prerequisites_are_reported() {
        let fx = Fixture::default();
        let mut state = rich_player();
        let err = enqueue(
            &fx.rules(),
            &mut state,
            EntityId::Research(ResearchType::EnergyTechnology),
            QueueKind::Research,
            1,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::RequirementsNotMet { .. }));
        assert!(state.queue.is_empty());
    }

    #[test]
    fn mismatched_kind_is_unknown() {
        let fx = Fixture::default();
        let mut state = rich_player();
        let err = enqueue(
            &fx.rules(),
            &mut state,
            building(BuildingType::MetalMine),
            QueueKind::Ship,
            3,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::UnknownEntity { .. }));
    }

    #[test]
    fn ship_orders_add_units() {
        let fx = Fixture::default();
        let mut state = rich_player();
        state.buildings.insert(BuildingType::Shipyard, 2);
        state.research.insert(ResearchType::CombustionDrive, 2);
        let cargo = EntityId::Ship(ShipType::SmallCargo);
        enqueue(&fx.rules(), &mut state, cargo, QueueKind::Ship, 4, 0).unwrap();
        settle_due(&mut state, u64::MAX);
        assert_eq!(count_of(&state.fleet, &ShipType::SmallCargo), 4);
    }
}
