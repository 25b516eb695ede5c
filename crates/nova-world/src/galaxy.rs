//! Galaxy generation, slot ownership and debris fields.
//!
//! Occupancy is a pure function of `(world seed, coordinate)`: a slot that
//! no player has claimed hosts an NPC iff its hash falls under the configured
//! occupancy probability. NPC state is materialised lazily the first time a
//! slot is observed, and generation is seeded by the same coordinate hash so
//! that the same slot always yields the same name, personality and
//! appearance.

use nova_types::{
    BuildingLevels, BuildingType, Coordinates, DebrisField, Defenses, DefenseType, Fleet,
    GlobalState, NpcState, Personality, PlanetRecord, PlayerId, ResearchLevels, ResearchType,
    Resources, ShipType, Timestamp,
};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::UniverseConfig;
use crate::error::WorldError;
use crate::rng::{self, tag};

const NAME_PREFIXES: [&str; 12] = [
    "Kor", "Vel", "Zan", "Thar", "Ix", "Mor", "Quel", "Dra", "Syl", "Orn", "Vex", "Cal",
];
const NAME_SUFFIXES: [&str; 10] = [
    "ath", "ion", "ara", "ex", "or", "une", "is", "eth", "ax", "ora",
];

/// Whether a coordinate lies inside the universe.
pub const fn in_range(universe: &UniverseConfig, coords: &Coordinates) -> bool {
    coords.galaxy >= 1
        && coords.galaxy <= universe.galaxies
        && coords.system >= 1
        && coords.system <= universe.systems
        && coords.position >= 1
        && coords.position <= universe.positions
}

/// Whether generation places an NPC at `coords` (ignoring player claims).
pub fn hosts_npc(universe: &UniverseConfig, coords: &Coordinates) -> bool {
    let hash = rng::mix(&[universe.seed, rng::coord_key(coords), tag::OCCUPANCY]);
    rng::unit_interval(hash) < universe.npc_occupancy
}

/// Whether a slot is free for a new home or colony.
pub fn is_free(universe: &UniverseConfig, global: &GlobalState, coords: &Coordinates) -> bool {
    in_range(universe, coords)
        && !global.is_claimed(coords)
        && !global.npcs.contains_key(coords)
        && !hosts_npc(universe, coords)
}

/// Build the NPC that generation places at `coords`.
pub fn generate_npc(universe: &UniverseConfig, coords: Coordinates, now: Timestamp) -> NpcState {
    let mut rng = rng::seeded(&[universe.seed, rng::coord_key(&coords), tag::NPC_GENESIS]);

    let personality = Personality::ALL
        .get(rng.random_range(0..Personality::ALL.len()))
        .copied()
        .unwrap_or(Personality::Balanced);
    let prefix = NAME_PREFIXES
        .get(rng.random_range(0..NAME_PREFIXES.len()))
        .copied()
        .unwrap_or("Kor");
    let suffix = NAME_SUFFIXES
        .get(rng.random_range(0..NAME_SUFFIXES.len()))
        .copied()
        .unwrap_or("ath");
    let appearance: u32 = rng.random();

    // Farther systems start more developed.
    let depth = coords.system.saturating_div(20).saturating_add(1);
    let mut buildings = BuildingLevels::new();
    for (building, low, high) in [
        (BuildingType::MetalMine, 2_u32, 6_u32),
        (BuildingType::CrystalMine, 1, 5),
        (BuildingType::DeuteriumSynthesizer, 0, 3),
        (BuildingType::SolarPlant, 3, 7),
        (BuildingType::RoboticsFactory, 0, 2),
        (BuildingType::Shipyard, 1, 3),
        (BuildingType::ResearchLab, 1, 3),
    ] {
        let level = rng.random_range(low..=high).saturating_add(depth);
        buildings.insert(building, level);
    }

    let mut research = ResearchLevels::new();
    for tech in [
        ResearchType::EnergyTechnology,
        ResearchType::CombustionDrive,
        ResearchType::WeaponsTechnology,
        ResearchType::ShieldingTechnology,
        ResearchType::ArmourTechnology,
    ] {
        research.insert(tech, rng.random_range(0..=2_u32).saturating_add(depth / 2));
    }

    let mut fleet = Fleet::new();
    fleet.insert(ShipType::LightFighter, rng.random_range(0..=10_u32).saturating_mul(depth));
    fleet.insert(ShipType::SmallCargo, rng.random_range(0..=3_u32));
    fleet.insert(ShipType::EspionageProbe, rng.random_range(0..=3_u32));
    if personality == Personality::Aggressive {
        fleet.insert(ShipType::HeavyFighter, rng.random_range(1..=5_u32).saturating_mul(depth));
    }
    fleet.retain(|_, count| *count > 0);

    let mut defenses = Defenses::new();
    defenses.insert(
        DefenseType::RocketLauncher,
        rng.random_range(0..=15_u32).saturating_mul(depth),
    );
    defenses.insert(DefenseType::LightLaser, rng.random_range(0..=5_u32).saturating_mul(depth));
    defenses.retain(|_, count| *count > 0);

    let resources = Resources::from_units(
        rng.random_range(500..=5000_u64),
        rng.random_range(250..=3000_u64),
        rng.random_range(0..=1000_u64),
    );

    NpcState {
        coords,
        name: format!("{prefix}{suffix}"),
        personality,
        appearance,
        resources,
        buildings,
        research,
        fleet,
        defenses,
        last_update: now,
    }
}

/// Materialise the NPC at `coords` if generation places one there.
///
/// Returns `true` if an NPC exists at the slot after the call.
pub fn ensure_npc(
    universe: &UniverseConfig,
    global: &mut GlobalState,
    coords: Coordinates,
    now: Timestamp,
) -> bool {
    if global.npcs.contains_key(&coords) {
        return true;
    }
    if global.is_claimed(&coords) || !in_range(universe, &coords) || !hosts_npc(universe, &coords)
    {
        return false;
    }
    let npc = generate_npc(universe, coords, now);
    debug!(%coords, name = %npc.name, personality = ?npc.personality, "npc materialised");
    global.npcs.insert(coords, npc);
    true
}

/// Claim a home slot for a new player.
///
/// The scan starts at a system derived from the world seed and the player
/// id, walks positions then systems then galaxies, and takes the first slot
/// that is neither claimed nor NPC-occupied.
pub fn claim_home(
    universe: &UniverseConfig,
    global: &mut GlobalState,
    player: PlayerId,
    name: &str,
) -> Result<Coordinates, WorldError> {
    let systems = universe.systems.max(1);
    let start_hash = rng::mix(&[universe.seed, player.seed(), tag::HOME_SCAN]);
    let start_system =
        u32::try_from(start_hash.checked_rem(u64::from(systems)).unwrap_or(0)).unwrap_or(0);

    for galaxy in 1..=universe.galaxies {
        for offset in 0..systems {
            let system = start_system
                .saturating_add(offset)
                .checked_rem(systems)
                .unwrap_or(0)
                .saturating_add(1);
            for position in 1..=universe.positions {
                let coords = Coordinates::new(galaxy, system, position);
                if is_free(universe, global, &coords) {
                    global.planets.insert(
                        coords,
                        PlanetRecord {
                            owner: player,
                            owner_name: name.to_owned(),
                            is_home: true,
                            snapshot: None,
                        },
                    );
                    return Ok(coords);
                }
            }
        }
    }
    Err(WorldError::UniverseFull)
}

// ---------------------------------------------------------------------------
// Debris
// ---------------------------------------------------------------------------

/// Add salvage to a slot.
pub fn add_debris(global: &mut GlobalState, coords: Coordinates, metal: Decimal, crystal: Decimal) {
    if metal <= Decimal::ZERO && crystal <= Decimal::ZERO {
        return;
    }
    let field = global.debris.entry(coords).or_default();
    field.metal = field.metal.saturating_add(metal.max(Decimal::ZERO));
    field.crystal = field.crystal.saturating_add(crystal.max(Decimal::ZERO));
}

/// Remove up to `cargo` units of salvage from a slot.
///
/// When the field holds more than the cargo allows, metal and crystal are
/// taken in proportion to what the field holds. Empty fields are dropped.
pub fn harvest_debris(
    global: &mut GlobalState,
    coords: &Coordinates,
    cargo: Decimal,
) -> DebrisField {
    let Some(field) = global.debris.get_mut(coords) else {
        return DebrisField::default();
    };
    let available = field.metal.saturating_add(field.crystal);
    let taken = if available <= cargo {
        *field
    } else if available > Decimal::ZERO {
        let share = cargo.checked_div(available).unwrap_or(Decimal::ZERO);
        let metal = field.metal.saturating_mul(share).floor();
        DebrisField {
            metal,
            crystal: cargo.saturating_sub(metal).min(field.crystal).floor(),
        }
    } else {
        DebrisField::default()
    };
    field.metal = field.metal.saturating_sub(taken.metal);
    field.crystal = field.crystal.saturating_sub(taken.crystal);
    if field.is_empty() {
        global.debris.remove(coords);
    }
    taken
}

// ---------------------------------------------------------------------------
// System view
// ---------------------------------------------------------------------------

/// What occupies a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SlotOccupant {
    /// Nobody.
    Empty,
    /// An NPC planet.
    Npc {
        /// NPC name.
        name: String,
        /// Behavioural profile.
        personality: Personality,
        /// Cosmetic seed.
        appearance: u32,
    },
    /// A player planet.
    Player {
        /// Owner.
        owner: PlayerId,
        /// Owner display name.
        name: String,
        /// Home planet or colony.
        is_home: bool,
    },
}

/// One slot of a system view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    /// Slot coordinates.
    pub coords: Coordinates,
    /// Occupant.
    pub occupant: SlotOccupant,
    /// Salvage present, if any.
    pub debris: Option<DebrisField>,
}

/// All slots of one solar system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemView {
    /// Galaxy number.
    pub galaxy: u32,
    /// System number.
    pub system: u32,
    /// Slots in position order.
    pub slots: Vec<SlotView>,
}

/// Observe a solar system, materialising NPCs for occupied slots.
pub fn view_system(
    universe: &UniverseConfig,
    global: &mut GlobalState,
    galaxy: u32,
    system: u32,
    now: Timestamp,
) -> Result<SystemView, WorldError> {
    if !in_range(universe, &Coordinates::new(galaxy, system, 1)) {
        return Err(WorldError::NoSuchSystem { galaxy, system });
    }

    let mut slots = Vec::with_capacity(usize::try_from(universe.positions).unwrap_or(0));
    for position in 1..=universe.positions {
        let coords = Coordinates::new(galaxy, system, position);
        let occupant = if let Some(planet) = global.planets.get(&coords) {
            SlotOccupant::Player {
                owner: planet.owner,
                name: planet.owner_name.clone(),
                is_home: planet.is_home,
            }
        } else if ensure_npc(universe, global, coords, now) {
            global
                .npcs
                .get(&coords)
                .map_or(SlotOccupant::Empty, |npc| SlotOccupant::Npc {
                    name: npc.name.clone(),
                    personality: npc.personality,
                    appearance: npc.appearance,
                })
        } else {
            SlotOccupant::Empty
        };
        slots.push(SlotView {
            coords,
            occupant,
            debris: global.debris.get(&coords).copied(),
        });
    }

    Ok(SystemView {
        galaxy,
        system,
        slots,
    })
}
