//! Shared fixtures for unit tests.

use nova_types::{Coordinates, GlobalState, PlayerId, PlayerState, Resources};
use nova_world::{EconomyConfig, StandardCatalog, UniverseConfig, WorldEventConfig};

use crate::config::{CombatConfig, MissionConfig, NpcConfig};
use crate::rules::Ruleset;

/// Owns every configuration section so tests can borrow a [`Ruleset`].
#[derive(Debug, Default)]
pub struct Fixture {
    pub universe: UniverseConfig,
    pub economy: EconomyConfig,
    pub combat: CombatConfig,
    pub missions: MissionConfig,
    pub npc: NpcConfig,
    pub events: WorldEventConfig,
}

impl Fixture {
    pub fn rules(&self) -> Ruleset<'_> {
        Ruleset {
            catalog: &StandardCatalog,
            universe: &self.universe,
            economy: &self.economy,
            combat: &self.combat,
            missions: &self.missions,
            npc: &self.npc,
            events: &self.events,
        }
    }
}

pub const HOME: Coordinates = Coordinates::new(1, 10, 4);

pub fn rich_player() -> PlayerState {
    PlayerState::fresh(
        PlayerId::from_u128(1),
        "tester",
        HOME,
        Resources::from_units(1_000_000, 1_000_000, 1_000_000),
        0,
    )
}

pub fn global_with_home(player: &PlayerState) -> GlobalState {
    let mut global = GlobalState::new(42);
    global.planets.insert(
        player.home,
        nova_types::PlanetRecord {
            owner: player.id,
            owner_name: player.name.clone(),
            is_home: true,
            snapshot: None,
        },
    );
    global
}
