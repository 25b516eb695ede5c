//! Fleet conservation checks.
//!
//! Ships are created only by shipyard completions, hires, expedition and
//! exploration finds, and destroyed only by battles, expedition losses and
//! colonization. Time passing on its own moves ships between the home
//! fleet and in-flight missions but never changes their total:
//!
//! ```text
//! home(ship) + sum(in_flight(ship)) == constant
//! ```
//!
//! [`verify_fleet_conservation`] compares two snapshots of a player and
//! reports every ship type whose total moved.

use std::collections::BTreeMap;

use nova_types::{Fleet, PlayerState, ShipType, merge_counts};

/// A ship type whose total changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetAnomaly {
    /// Ship type to (total before, total after).
    pub imbalances: BTreeMap<ShipType, (u32, u32)>,
    /// Human-readable summary.
    pub message: String,
}

/// Outcome of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Every ship is accounted for.
    Balanced,
    /// One or more ship totals moved.
    Anomaly(FleetAnomaly),
}

/// Ships at home plus ships owned by in-flight missions.
pub fn ship_totals(state: &PlayerState) -> Fleet {
    let mut total = state.fleet.clone();
    merge_counts(&mut total, &state.ships_in_flight());
    total
}

/// Compare ship totals of two snapshots of the same player.
pub fn verify_fleet_conservation(before: &PlayerState, after: &PlayerState) -> ConservationResult {
    let old = ship_totals(before);
    let new = ship_totals(after);
    let imbalances: BTreeMap<ShipType, (u32, u32)> = ShipType::ALL
        .into_iter()
        .filter_map(|ship| {
            let pair = (nova_types::count_of(&old, &ship), nova_types::count_of(&new, &ship));
            (pair.0 != pair.1).then_some((ship, pair))
        })
        .collect();

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let count = imbalances.len();
        ConservationResult::Anomaly(FleetAnomaly {
            imbalances,
            message: format!(
                "FLEET_ANOMALY for player {}: {count} ship type(s) changed",
                after.id
            ),
        })
    }
}
