//! New player creation.

use nova_agents::Ruleset;
use nova_types::{GlobalState, PlayerId, PlayerState, Resources, Timestamp};
use nova_world::WorldError;
use nova_world::galaxy::claim_home;
use nova_world::rng::{seeded, tag};
use tracing::info;

use crate::advance::publish_home;

/// Create a player with a freshly claimed home slot.
///
/// Claims the first free slot of a seed-derived scan, seeds the starting
/// stockpile, primes every world-event timer at `now` and publishes the
/// home snapshot into `global`.
pub fn new_player(
    rules: &Ruleset<'_>,
    global: &mut GlobalState,
    id: PlayerId,
    name: &str,
    now: Timestamp,
) -> Result<PlayerState, WorldError> {
    let home = claim_home(rules.universe, global, id, name)?;
    let economy = rules.economy;
    let mut state = PlayerState::fresh(
        id,
        name,
        home,
        Resources::from_units(
            economy.starting_metal,
            economy.starting_crystal,
            economy.starting_deuterium,
        ),
        now,
    );
    let mut rng = seeded(&[global.seed, id.seed(), now, tag::WORLD_EVENT]);
    rules.scheduler().prime(&mut state.events, now, &mut rng);
    publish_home(rules, &state, global, now);
    info!(player = %id, %home, name, "player created");
    Ok(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nova_types::EventPhase;
    use nova_world::StandardCatalog;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn players_get_distinct_primed_homes() {
        let config = GameConfig::default();
        let rules = config.ruleset(&StandardCatalog);
        let mut global = GlobalState::new(config.universe.seed);

        let a = new_player(&rules, &mut global, PlayerId::from_u128(1), "ada", 1_000).unwrap();
        let b = new_player(&rules, &mut global, PlayerId::from_u128(2), "bo", 1_000).unwrap();
        assert_ne!(a.home, b.home);
        assert_eq!(a.resources, Resources::from_units(500, 500, 0));
        assert_eq!(a.credits, Decimal::ZERO);
        assert_eq!(a.last_save_time, 1_000);
        assert_eq!(a.events.merchant.timer.phase, EventPhase::Inactive);
        assert!(a.events.merchant.timer.next_transition_at.is_some_and(|t| t > 1_000));
        assert!(a.events.black_market.next_payout_at.is_some());

        let record = global.planets.get(&a.home).unwrap();
        assert!(record.is_home);
        assert_eq!(record.owner, a.id);
        assert!(record.snapshot.is_some());
        assert!(!global.npcs.contains_key(&a.home));
    }
}
