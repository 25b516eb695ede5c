//! Enumeration types for the Nova game.
//!
//! The four content families (buildings, research, ships, defenses) are
//! closed enums joined by the [`EntityId`] tagged union. Every catalog
//! lookup is keyed by `EntityId` and resolved with a `match`, never by
//! probing string-keyed tables.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A stockpiled planetary resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Structural metal, the bulk construction material.
    Metal,
    /// Crystal, used for electronics and alloys.
    Crystal,
    /// Deuterium, used as fuel and for advanced research.
    Deuterium,
}

impl Resource {
    /// All resources in canonical order.
    pub const ALL: [Self; 3] = [Self::Metal, Self::Crystal, Self::Deuterium];
}

// ---------------------------------------------------------------------------
// Content families
// ---------------------------------------------------------------------------

/// A planetary building. Buildings are leveled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BuildingType {
    /// Produces metal.
    MetalMine,
    /// Produces crystal.
    CrystalMine,
    /// Produces deuterium.
    DeuteriumSynthesizer,
    /// Produces energy.
    SolarPlant,
    /// Produces energy at a higher tier.
    FusionReactor,
    /// Speeds up building and shipyard construction.
    RoboticsFactory,
    /// Halves construction time per level.
    NaniteFactory,
    /// Builds ships and defenses.
    Shipyard,
    /// Enables and speeds up research.
    ResearchLab,
    /// Raises the metal storage cap.
    MetalStorage,
    /// Raises the crystal storage cap.
    CrystalStorage,
    /// Raises the deuterium storage cap.
    DeuteriumTank,
}

impl BuildingType {
    /// Every building type.
    pub const ALL: [Self; 12] = [
        Self::MetalMine,
        Self::CrystalMine,
        Self::DeuteriumSynthesizer,
        Self::SolarPlant,
        Self::FusionReactor,
        Self::RoboticsFactory,
        Self::NaniteFactory,
        Self::Shipyard,
        Self::ResearchLab,
        Self::MetalStorage,
        Self::CrystalStorage,
        Self::DeuteriumTank,
    ];

    /// The resource a mine produces, if this building is a mine.
    pub const fn mined_resource(self) -> Option<Resource> {
        match self {
            Self::MetalMine => Some(Resource::Metal),
            Self::CrystalMine => Some(Resource::Crystal),
            Self::DeuteriumSynthesizer => Some(Resource::Deuterium),
            _ => None,
        }
    }

    /// The resource a storage building protects, if this is a storage building.
    pub const fn stored_resource(self) -> Option<Resource> {
        match self {
            Self::MetalStorage => Some(Resource::Metal),
            Self::CrystalStorage => Some(Resource::Crystal),
            Self::DeuteriumTank => Some(Resource::Deuterium),
            _ => None,
        }
    }
}

/// A research technology. Research is leveled and empire-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ResearchType {
    /// Energy technology.
    EnergyTechnology,
    /// Laser technology.
    LaserTechnology,
    /// Ion technology.
    IonTechnology,
    /// Hyperspace technology.
    HyperspaceTechnology,
    /// Plasma technology.
    PlasmaTechnology,
    /// Combustion drive (+10% speed per level for combustion ships).
    CombustionDrive,
    /// Impulse drive (+20% speed per level for impulse ships).
    ImpulseDrive,
    /// Hyperspace drive (+30% speed per level for hyperspace ships).
    HyperspaceDrive,
    /// Espionage technology.
    EspionageTechnology,
    /// Computer technology.
    ComputerTechnology,
    /// Astrophysics: raises expedition and colony limits.
    Astrophysics,
    /// Weapons technology: +10% attack per level.
    WeaponsTechnology,
    /// Shielding technology: +10% shields per level.
    ShieldingTechnology,
    /// Armour technology: +10% structural integrity per level.
    ArmourTechnology,
}

impl ResearchType {
    /// Every research type.
    pub const ALL: [Self; 14] = [
        Self::EnergyTechnology,
        Self::LaserTechnology,
        Self::IonTechnology,
        Self::HyperspaceTechnology,
        Self::PlasmaTechnology,
        Self::CombustionDrive,
        Self::ImpulseDrive,
        Self::HyperspaceDrive,
        Self::EspionageTechnology,
        Self::ComputerTechnology,
        Self::Astrophysics,
        Self::WeaponsTechnology,
        Self::ShieldingTechnology,
        Self::ArmourTechnology,
    ];
}

/// A ship hull type. Ships are counted, and each type has an upgrade tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ShipType {
    /// Small cargo transporter.
    SmallCargo,
    /// Large cargo transporter.
    LargeCargo,
    /// Light fighter.
    LightFighter,
    /// Heavy fighter.
    HeavyFighter,
    /// Cruiser.
    Cruiser,
    /// Battleship.
    Battleship,
    /// Battlecruiser.
    Battlecruiser,
    /// Bomber.
    Bomber,
    /// Destroyer.
    Destroyer,
    /// Deathstar.
    Deathstar,
    /// Recycler: the only hull able to harvest debris.
    Recycler,
    /// Espionage probe: required for spy missions.
    EspionageProbe,
    /// Colony ship: consumed when founding a colony.
    ColonyShip,
}

impl ShipType {
    /// Every ship type.
    pub const ALL: [Self; 13] = [
        Self::SmallCargo,
        Self::LargeCargo,
        Self::LightFighter,
        Self::HeavyFighter,
        Self::Cruiser,
        Self::Battleship,
        Self::Battlecruiser,
        Self::Bomber,
        Self::Destroyer,
        Self::Deathstar,
        Self::Recycler,
        Self::EspionageProbe,
        Self::ColonyShip,
    ];

    /// Hulls built for fighting (sent by NPC attacks).
    pub const fn is_combat_ship(self) -> bool {
        matches!(
            self,
            Self::LightFighter
                | Self::HeavyFighter
                | Self::Cruiser
                | Self::Battleship
                | Self::Battlecruiser
                | Self::Bomber
                | Self::Destroyer
                | Self::Deathstar
        )
    }
}

/// A planetary defense structure. Defenses are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DefenseType {
    /// Rocket launcher.
    RocketLauncher,
    /// Light laser.
    LightLaser,
    /// Heavy laser.
    HeavyLaser,
    /// Gauss cannon.
    GaussCannon,
    /// Ion cannon.
    IonCannon,
    /// Plasma turret.
    PlasmaTurret,
    /// Small shield dome.
    SmallShieldDome,
    /// Large shield dome.
    LargeShieldDome,
}

impl DefenseType {
    /// Every defense type.
    pub const ALL: [Self; 8] = [
        Self::RocketLauncher,
        Self::LightLaser,
        Self::HeavyLaser,
        Self::GaussCannon,
        Self::IonCannon,
        Self::PlasmaTurret,
        Self::SmallShieldDome,
        Self::LargeShieldDome,
    ];
}

/// Closed union over every catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id")]
#[ts(export, export_to = "bindings/")]
pub enum EntityId {
    /// A building.
    Building(BuildingType),
    /// A research technology.
    Research(ResearchType),
    /// A ship hull.
    Ship(ShipType),
    /// A defense structure.
    Defense(DefenseType),
}

/// A prerequisite that must hold before an entity can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind")]
#[ts(export, export_to = "bindings/")]
pub enum Requirement {
    /// A building at or above a level.
    Building {
        /// Required building.
        building: BuildingType,
        /// Minimum level.
        min_level: u32,
    },
    /// A research at or above a level.
    Research {
        /// Required research.
        research: ResearchType,
        /// Minimum level.
        min_level: u32,
    },
}

/// A unit that takes part in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CombatUnit {
    /// A ship.
    Ship(ShipType),
    /// A defense structure.
    Defense(DefenseType),
}

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

/// What a queue item produces when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum QueueKind {
    /// Raises a building by one level.
    Building,
    /// Raises a research by one level.
    Research,
    /// Raises a ship type's upgrade tier by one.
    ShipUpgrade,
    /// Adds ships to the home fleet.
    Ship,
    /// Adds defense structures.
    Defense,
}

impl QueueKind {
    /// The lane this kind of work runs in.
    pub const fn lane(self) -> QueueLane {
        match self {
            Self::Building | Self::Research | Self::ShipUpgrade => QueueLane::Construction,
            Self::Ship | Self::Defense => QueueLane::Shipyard,
        }
    }

    /// Whether the item raises a level (as opposed to adding a count).
    pub const fn is_leveled(self) -> bool {
        matches!(self, Self::Building | Self::Research | Self::ShipUpgrade)
    }

    /// Whether `entity` is a valid subject for this kind of queue item.
    pub const fn accepts(self, entity: EntityId) -> bool {
        matches!(
            (self, entity),
            (Self::Building, EntityId::Building(_))
                | (Self::Research, EntityId::Research(_))
                | (Self::ShipUpgrade | Self::Ship, EntityId::Ship(_))
                | (Self::Defense, EntityId::Defense(_))
        )
    }
}

/// One of the two independent production lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum QueueLane {
    /// Buildings, research and ship upgrades.
    Construction,
    /// Ships and defenses.
    Shipyard,
}

impl QueueLane {
    /// Both lanes.
    pub const ALL: [Self; 2] = [Self::Construction, Self::Shipyard];
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// The purpose of a fleet mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum MissionType {
    /// Fight whatever holds the target slot.
    Attack,
    /// Gather intelligence on the target slot.
    Spy,
    /// Collect debris at the target slot.
    Harvest,
    /// Venture into deep space for a random outcome.
    Expedition,
    /// Found a colony on an unclaimed slot.
    Colonize,
    /// Hold at the target slot, then draw an exploration outcome.
    Explore,
}

/// Outcome table for expeditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ExpeditionOutcome {
    /// Resources found.
    FindResources,
    /// Credits found.
    FindMoney,
    /// Derelict ships join the fleet.
    FindFleet,
    /// Nothing happens.
    Nothing,
    /// Pirates destroy part of the fleet.
    Pirates,
    /// Aliens destroy a larger part of the fleet.
    Aliens,
    /// The return trip is delayed.
    Delay,
    /// The whole fleet is lost.
    Lost,
}

impl ExpeditionOutcome {
    /// Every outcome in table order.
    pub const ALL: [Self; 8] = [
        Self::FindResources,
        Self::FindMoney,
        Self::FindFleet,
        Self::Nothing,
        Self::Pirates,
        Self::Aliens,
        Self::Delay,
        Self::Lost,
    ];
}

/// Outcome table for exploration holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ExplorationOutcome {
    /// A hostile force attacks the exploring fleet.
    Hostiles,
    /// A boost is found and added to inventory.
    FindBoost,
    /// Resources found.
    FindResources,
    /// A wreck yields ships.
    FindShipWreck,
    /// Nothing happens.
    Nothing,
}

impl ExplorationOutcome {
    /// Every outcome in table order.
    pub const ALL: [Self; 5] = [
        Self::Hostiles,
        Self::FindBoost,
        Self::FindResources,
        Self::FindShipWreck,
        Self::Nothing,
    ];
}

/// The result of a battle from the attacker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BattleOutcome {
    /// The defender has no surviving units.
    AttackerWins,
    /// The attacker has no surviving units.
    DefenderWins,
    /// Both sides kept units.
    Draw,
}

// ---------------------------------------------------------------------------
// NPCs, boosts and world events
// ---------------------------------------------------------------------------

/// An NPC's behavioural profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Personality {
    /// Favors capital ships and weapons research; launches attacks.
    Aggressive,
    /// Favors mines, storage and the research lab.
    Economic,
    /// Mixes both.
    Balanced,
}

impl Personality {
    /// Every personality.
    pub const ALL: [Self; 3] = [Self::Aggressive, Self::Economic, Self::Balanced];
}

/// A modifier held in inventory and later activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BoostType {
    /// +10% mine output per level while active.
    Production,
    /// +10% attack per level while active.
    Combat,
    /// Raises the per-lane queue capacity to the boost level while active.
    QueueCapacity,
    /// One-shot: -10% per level on the next building or research order.
    CostReduction,
}

impl BoostType {
    /// Every boost type.
    pub const ALL: [Self; 4] = [
        Self::Production,
        Self::Combat,
        Self::QueueCapacity,
        Self::CostReduction,
    ];
}

/// The seven transient world-event families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WorldEventKind {
    /// Travelling merchant offering resource trades for credits.
    Merchant,
    /// Pirate mercenaries offering a fleet for hire.
    PirateMercenaries,
    /// Incoming asteroid: damages a building or leaves resources.
    AsteroidImpact,
    /// A rich vein multiplying one resource's production.
    ResourceVein,
    /// An ancient artifact offering a one-time choice.
    AncientArtifact,
    /// A plague weakening infected ship types in combat.
    SpacePlague,
    /// Hourly black-market credit income.
    BlackMarket,
}

impl WorldEventKind {
    /// Every family.
    pub const ALL: [Self; 7] = [
        Self::Merchant,
        Self::PirateMercenaries,
        Self::AsteroidImpact,
        Self::ResourceVein,
        Self::AncientArtifact,
        Self::SpacePlague,
        Self::BlackMarket,
    ];
}

/// Lifecycle phase shared by the world-event state machines.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum EventPhase {
    /// Nothing is happening; waiting for the next occurrence.
    #[default]
    Inactive,
    /// Announced but not yet in effect.
    Incoming,
    /// In effect.
    Active,
    /// Offered to the player and waiting for a decision.
    Available,
}

/// Direction of a merchant trade from the player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TradeSide {
    /// The player buys resources with credits.
    Buy,
    /// The player sells resources for credits.
    Sell,
}

/// The player's pick when an ancient artifact is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ArtifactChoice {
    /// Gain one level in a random research the player can use.
    Research,
    /// Gain a lump sum of credits.
    Credits,
}

/// Category tag on a notification returned by `advance` or an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NotificationKind {
    /// A queue item finished.
    Completed,
    /// A queue item was accepted.
    Queued,
    /// A fleet departed.
    FleetDispatched,
    /// A fleet reached its target.
    FleetArrived,
    /// A fleet came home.
    FleetReturned,
    /// A battle took place.
    Battle,
    /// An espionage report was produced or received.
    Espionage,
    /// An expedition or exploration outcome was drawn.
    Discovery,
    /// A colony was founded or the attempt failed.
    Colonization,
    /// Debris was harvested.
    Harvest,
    /// An active boost started or ran out.
    Boost,
    /// A world event changed phase.
    WorldEvent,
    /// Credits or resources changed hands through a world event.
    Trade,
    /// A message was read or deleted.
    Message,
}
