//! Core state structs for the Nova game.
//!
//! [`PlayerState`] is the per-player blob persisted by the store and advanced
//! by the catch-up engine. [`GlobalState`] holds everything shared between
//! players: NPC planets, NPC fleets, debris fields, the planet registry and
//! the cross-player inbox.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coords::Coordinates;
use crate::enums::{
    BoostType, BuildingType, DefenseType, EntityId, EventPhase, MissionType, Personality,
    QueueKind, QueueLane, Resource, ResearchType, ShipType,
};
use crate::ids::{BoostId, MissionId, PlayerId};
use crate::messages::{BattleReport, Message};

/// Game time: milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// One hour of game time in milliseconds.
pub const HOUR_MS: u64 = 3_600_000;

/// Building type to level.
pub type BuildingLevels = BTreeMap<BuildingType, u32>;
/// Research type to level.
pub type ResearchLevels = BTreeMap<ResearchType, u32>;
/// Ship type to upgrade tier.
pub type ShipLevels = BTreeMap<ShipType, u32>;
/// Ship type to count.
pub type Fleet = BTreeMap<ShipType, u32>;
/// Defense type to count.
pub type Defenses = BTreeMap<DefenseType, u32>;

/// Read a level or count from a map, treating a missing key as zero.
pub fn count_of<K: Ord>(map: &BTreeMap<K, u32>, key: &K) -> u32 {
    map.get(key).copied().unwrap_or(0)
}

/// Total number of units in a fleet or defense map.
pub fn unit_total<K>(map: &BTreeMap<K, u32>) -> u64 {
    map.values().map(|c| u64::from(*c)).fold(0_u64, u64::saturating_add)
}

/// Add every count of `other` into `into`.
pub fn merge_counts<K: Ord + Copy>(into: &mut BTreeMap<K, u32>, other: &BTreeMap<K, u32>) {
    for (kind, count) in other {
        if *count == 0 {
            continue;
        }
        let slot = into.entry(*kind).or_insert(0);
        *slot = slot.saturating_add(*count);
    }
}

/// Subtract `other` from `from`, failing without mutation if any count
/// would go negative. Zero entries are removed.
pub fn subtract_counts<K: Ord + Copy>(
    from: &mut BTreeMap<K, u32>,
    other: &BTreeMap<K, u32>,
) -> bool {
    let affordable = other
        .iter()
        .all(|(kind, count)| count_of(from, kind) >= *count);
    if !affordable {
        return false;
    }
    for (kind, count) in other {
        let remaining = count_of(from, kind).saturating_sub(*count);
        if remaining == 0 {
            from.remove(kind);
        } else {
            from.insert(*kind, remaining);
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A bundle of the three planetary resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Resources {
    /// Metal.
    #[ts(as = "String")]
    pub metal: Decimal,
    /// Crystal.
    #[ts(as = "String")]
    pub crystal: Decimal,
    /// Deuterium.
    #[ts(as = "String")]
    pub deuterium: Decimal,
}

impl Resources {
    /// The empty bundle.
    pub const ZERO: Self = Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);

    /// Build a bundle from its three amounts.
    pub const fn new(metal: Decimal, crystal: Decimal, deuterium: Decimal) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
        }
    }

    /// Build a bundle from whole-unit amounts.
    pub fn from_units(metal: u64, crystal: u64, deuterium: u64) -> Self {
        Self::new(
            Decimal::from(metal),
            Decimal::from(crystal),
            Decimal::from(deuterium),
        )
    }

    /// Amount of one resource.
    pub const fn get(&self, resource: Resource) -> Decimal {
        match resource {
            Resource::Metal => self.metal,
            Resource::Crystal => self.crystal,
            Resource::Deuterium => self.deuterium,
        }
    }

    /// Mutable access to one resource.
    pub const fn get_mut(&mut self, resource: Resource) -> &mut Decimal {
        match resource {
            Resource::Metal => &mut self.metal,
            Resource::Crystal => &mut self.crystal,
            Resource::Deuterium => &mut self.deuterium,
        }
    }

    /// Whether every amount in `self` is at least the matching amount in `cost`.
    pub fn covers(&self, cost: &Self) -> bool {
        self.metal >= cost.metal && self.crystal >= cost.crystal && self.deuterium >= cost.deuterium
    }

    /// Component-wise addition.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self::new(
            self.metal.saturating_add(other.metal),
            self.crystal.saturating_add(other.crystal),
            self.deuterium.saturating_add(other.deuterium),
        )
    }

    /// Component-wise subtraction, or `None` if any component would go
    /// negative.
    pub fn checked_minus(&self, other: &Self) -> Option<Self> {
        self.covers(other).then(|| {
            Self::new(
                self.metal.saturating_sub(other.metal),
                self.crystal.saturating_sub(other.crystal),
                self.deuterium.saturating_sub(other.deuterium),
            )
        })
    }

    /// Component-wise subtraction floored at zero.
    #[must_use]
    pub fn minus_floored(&self, other: &Self) -> Self {
        let floor = |a: Decimal, b: Decimal| a.saturating_sub(b).max(Decimal::ZERO);
        Self::new(
            floor(self.metal, other.metal),
            floor(self.crystal, other.crystal),
            floor(self.deuterium, other.deuterium),
        )
    }

    /// Multiply every component by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: Decimal) -> Self {
        Self::new(
            self.metal.saturating_mul(factor),
            self.crystal.saturating_mul(factor),
            self.deuterium.saturating_mul(factor),
        )
    }

    /// Component-wise minimum against `cap`.
    #[must_use]
    pub fn capped(&self, cap: &Self) -> Self {
        Self::new(
            self.metal.min(cap.metal),
            self.crystal.min(cap.crystal),
            self.deuterium.min(cap.deuterium),
        )
    }

    /// Drop fractional units.
    #[must_use]
    pub fn floored(&self) -> Self {
        Self::new(self.metal.floor(), self.crystal.floor(), self.deuterium.floor())
    }

    /// Sum of all three components.
    pub fn total(&self) -> Decimal {
        self.metal
            .saturating_add(self.crystal)
            .saturating_add(self.deuterium)
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.metal.is_zero() && self.crystal.is_zero() && self.deuterium.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Queue, missions, colonies, boosts
// ---------------------------------------------------------------------------

/// One entry in a production lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueItem {
    /// What is being produced.
    pub entity: EntityId,
    /// Determines the lane and the completion effect.
    pub kind: QueueKind,
    /// Target level for leveled kinds, unit count for ships and defenses.
    pub amount: u32,
    /// When work on the item starts.
    pub start_time: Timestamp,
    /// When the item completes.
    pub end_time: Timestamp,
}

impl QueueItem {
    /// The lane this item occupies.
    pub const fn lane(&self) -> QueueLane {
        self.kind.lane()
    }
}

/// A fleet in flight. Owns its ships from departure until settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetMission {
    /// Mission identifier.
    pub id: MissionId,
    /// What the fleet does on arrival.
    pub mission_type: MissionType,
    /// Ships carried by the mission.
    pub fleet: Fleet,
    /// Slot the fleet left from and returns to.
    #[ts(as = "String")]
    pub origin: Coordinates,
    /// Destination slot.
    #[ts(as = "String")]
    pub target: Coordinates,
    /// Departure time.
    pub start_time: Timestamp,
    /// Arrival time at the target.
    pub arrival_time: Timestamp,
    /// Time the fleet is back home and settled.
    pub return_time: Timestamp,
    /// End of the exploration hold (explore missions only).
    pub exploration_end_time: Option<Timestamp>,
    /// Arrival resolution has run.
    pub arrival_processed: bool,
    /// Exploration outcome has been drawn.
    pub exploration_processed: bool,
    /// The fleet was recalled before arrival.
    pub recalled: bool,
    /// Resources carried home.
    pub loot: Resources,
    /// Credits carried home.
    #[ts(as = "String")]
    pub loot_credits: Decimal,
}

/// A colony founded by a colonize mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Colony {
    /// Colony slot.
    #[ts(as = "String")]
    pub coords: Coordinates,
    /// When the colony was founded.
    pub founded_at: Timestamp,
}

/// An unredeemed boost held in inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Boost {
    /// Inventory identifier.
    pub id: BoostId,
    /// Modifier family.
    pub boost_type: BoostType,
    /// Strength.
    pub level: u32,
    /// How long the boost lasts once activated.
    pub duration_ms: u64,
}

/// A boost that has been activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveBoost {
    /// Strength.
    pub level: u32,
    /// When the boost lapses.
    pub expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// World-event states
// ---------------------------------------------------------------------------

/// Phase and next scheduled transition of a world-event state machine.
///
/// `next_transition_at == None` means the timer has not been primed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventTimer {
    /// Current phase.
    pub phase: EventPhase,
    /// When the machine next changes phase.
    pub next_transition_at: Option<Timestamp>,
}

/// Travelling merchant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MerchantState {
    /// Lifecycle timer.
    pub timer: EventTimer,
    /// Credits per unit the player pays when buying.
    pub buy_prices: Resources,
    /// Credits per unit the player receives when selling.
    pub sell_prices: Resources,
}

/// Pirate mercenaries offering a fleet for hire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PirateMercenaryState {
    /// Lifecycle timer.
    pub timer: EventTimer,
    /// Ships on offer.
    pub offered_fleet: Fleet,
    /// Hire price in credits.
    #[ts(as = "String")]
    pub price: Decimal,
}

/// Incoming asteroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AsteroidState {
    /// Lifecycle timer.
    pub timer: EventTimer,
}

/// Temporary production multiplier on one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceVeinBonus {
    /// Lifecycle timer.
    pub timer: EventTimer,
    /// Boosted resource while active.
    pub resource: Option<Resource>,
    /// Production multiplier while active.
    pub multiplier: f64,
}

/// Ancient artifact awaiting the player's choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AncientArtifactState {
    /// Lifecycle timer.
    pub timer: EventTimer,
    /// Credits granted by the credits choice.
    #[ts(as = "String")]
    pub credit_reward: Decimal,
}

/// Space plague weakening some ship types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpacePlagueState {
    /// Lifecycle timer.
    pub timer: EventTimer,
    /// Infected ship types while active.
    pub infected: Vec<ShipType>,
}

/// Hourly black-market income.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BlackMarketState {
    /// Next hourly payout.
    pub next_payout_at: Option<Timestamp>,
    /// Credits paid so far.
    #[ts(as = "String")]
    pub total_paid: Decimal,
}

/// All world-event state machines of one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldEventStates {
    /// Merchant visits.
    pub merchant: MerchantState,
    /// Pirate mercenary offers.
    pub pirates: PirateMercenaryState,
    /// Asteroid impacts.
    pub asteroid: AsteroidState,
    /// Resource veins.
    pub vein: ResourceVeinBonus,
    /// Ancient artifacts.
    pub artifact: AncientArtifactState,
    /// Space plague.
    pub plague: SpacePlagueState,
    /// Black-market income.
    pub black_market: BlackMarketState,
}

// ---------------------------------------------------------------------------
// Player state
// ---------------------------------------------------------------------------

/// Everything one player owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerState {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Home planet slot.
    #[ts(as = "String")]
    pub home: Coordinates,
    /// Stockpile on the home planet.
    pub resources: Resources,
    /// Premium currency.
    #[ts(as = "String")]
    pub credits: Decimal,
    /// Building levels on the home planet.
    pub buildings: BuildingLevels,
    /// Empire-wide research levels.
    pub research: ResearchLevels,
    /// Per-ship-type upgrade tiers.
    pub ship_levels: ShipLevels,
    /// Ships at home.
    pub fleet: Fleet,
    /// Defense structures on the home planet.
    pub defenses: Defenses,
    /// Founded colonies.
    pub colonies: Vec<Colony>,
    /// Both production lanes, in insertion order.
    pub queue: Vec<QueueItem>,
    /// Fleets in flight.
    pub missions: Vec<FleetMission>,
    /// Unredeemed boosts.
    pub inventory: Vec<Boost>,
    /// Activated boosts by type.
    pub active_boosts: BTreeMap<BoostType, ActiveBoost>,
    /// World-event state machines.
    pub events: WorldEventStates,
    /// Message log, oldest first.
    pub messages: Vec<Message>,
    /// Time up to which the state has been advanced.
    pub last_save_time: Timestamp,
}

impl PlayerState {
    /// Level of a building.
    pub fn building_level(&self, building: BuildingType) -> u32 {
        count_of(&self.buildings, &building)
    }

    /// Level of a research.
    pub fn research_level(&self, research: ResearchType) -> u32 {
        count_of(&self.research, &research)
    }

    /// Upgrade tier of a ship type.
    pub fn ship_level(&self, ship: ShipType) -> u32 {
        count_of(&self.ship_levels, &ship)
    }

    /// A player with an empty planet and the given stockpile.
    pub fn fresh(
        id: PlayerId,
        name: impl Into<String>,
        home: Coordinates,
        resources: Resources,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            home,
            resources,
            credits: Decimal::ZERO,
            buildings: BuildingLevels::new(),
            research: ResearchLevels::new(),
            ship_levels: ShipLevels::new(),
            fleet: Fleet::new(),
            defenses: Defenses::new(),
            colonies: Vec::new(),
            queue: Vec::new(),
            missions: Vec::new(),
            inventory: Vec::new(),
            active_boosts: BTreeMap::new(),
            events: WorldEventStates::default(),
            messages: Vec::new(),
            last_save_time: now,
        }
    }

    /// Level of an active boost, zero when none is active.
    pub fn boost_level(&self, boost: BoostType) -> u32 {
        self.active_boosts.get(&boost).map_or(0, |b| b.level)
    }

    /// Items currently queued in a lane, in FIFO order.
    pub fn lane_items(&self, lane: QueueLane) -> impl Iterator<Item = &QueueItem> {
        self.queue.iter().filter(move |item| item.lane() == lane)
    }

    /// Ships currently owned by in-flight missions.
    pub fn ships_in_flight(&self) -> Fleet {
        let mut total = Fleet::new();
        for mission in &self.missions {
            merge_counts(&mut total, &mission.fleet);
        }
        total
    }

    /// Total ships owned, at home and in flight.
    pub fn total_ships(&self) -> u64 {
        unit_total(&self.fleet).saturating_add(unit_total(&self.ships_in_flight()))
    }

    /// Append a message, dropping the oldest entries beyond `cap`.
    pub fn push_message(&mut self, message: Message, cap: usize) {
        self.messages.push(message);
        let excess = self.messages.len().saturating_sub(cap);
        if excess > 0 {
            self.messages.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// Shared galaxy state
// ---------------------------------------------------------------------------

/// A non-player planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcState {
    /// Slot the NPC occupies.
    #[ts(as = "String")]
    pub coords: Coordinates,
    /// Generated name.
    pub name: String,
    /// Behavioural profile.
    pub personality: Personality,
    /// Cosmetic seed for the UI.
    pub appearance: u32,
    /// Stockpile.
    pub resources: Resources,
    /// Building levels.
    pub buildings: BuildingLevels,
    /// Research levels.
    pub research: ResearchLevels,
    /// Ships at home.
    pub fleet: Fleet,
    /// Defense structures.
    pub defenses: Defenses,
    /// Time up to which the NPC has been evolved.
    pub last_update: Timestamp,
}

/// A fleet launched by an NPC against a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcFleetMission {
    /// Mission identifier.
    pub id: MissionId,
    /// Launching NPC.
    #[ts(as = "String")]
    pub npc: Coordinates,
    /// Player whose planet is targeted.
    pub target_player: PlayerId,
    /// Targeted slot.
    #[ts(as = "String")]
    pub target: Coordinates,
    /// Attack or spy.
    pub mission_type: MissionType,
    /// Ships carried.
    pub fleet: Fleet,
    /// Departure time.
    pub start_time: Timestamp,
    /// Arrival time at the target.
    pub arrival_time: Timestamp,
    /// Time survivors are back at the NPC.
    pub return_time: Timestamp,
    /// Arrival resolution has run.
    pub arrival_processed: bool,
    /// Resources carried home.
    pub loot: Resources,
}

/// Salvage left at a slot by combat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DebrisField {
    /// Metal available.
    #[ts(as = "String")]
    pub metal: Decimal,
    /// Crystal available.
    #[ts(as = "String")]
    pub crystal: Decimal,
}

impl DebrisField {
    /// Whether nothing is left to harvest.
    pub fn is_empty(&self) -> bool {
        self.metal <= Decimal::ZERO && self.crystal <= Decimal::ZERO
    }
}

/// Public view of a player's home planet, refreshed on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlanetSnapshot {
    /// Stockpile at snapshot time.
    pub resources: Resources,
    /// Storage capacity at snapshot time.
    pub capacity: Resources,
    /// Ships at home.
    pub fleet: Fleet,
    /// Defense structures.
    pub defenses: Defenses,
    /// Building levels.
    pub buildings: BuildingLevels,
    /// Research levels.
    pub research: ResearchLevels,
    /// Ship upgrade tiers.
    pub ship_levels: ShipLevels,
    /// When the snapshot was taken.
    pub taken_at: Timestamp,
}

/// A slot claimed by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlanetRecord {
    /// Owning player.
    pub owner: PlayerId,
    /// Owner display name.
    pub owner_name: String,
    /// Home planet (as opposed to a colony).
    pub is_home: bool,
    /// Latest published snapshot (home planets only).
    pub snapshot: Option<PlanetSnapshot>,
}

/// Consequences of another actor's mission, applied on the victim's next
/// advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export, export_to = "bindings/")]
pub enum InboundReport {
    /// The planet was attacked.
    Attacked {
        /// When the battle happened.
        at: Timestamp,
        /// Ships lost at home.
        ship_losses: Fleet,
        /// Defense structures lost.
        defense_losses: Defenses,
        /// Resources carried off.
        stolen: Resources,
        /// Battle report for the message log.
        report: BattleReport,
    },
    /// The planet was spied on.
    Spied {
        /// When the probe arrived.
        at: Timestamp,
        /// Where the probe came from.
        #[ts(as = "String")]
        from: Coordinates,
        /// Who sent it.
        by: String,
    },
}

impl InboundReport {
    /// When the underlying event happened.
    pub const fn at(&self) -> Timestamp {
        match self {
            Self::Attacked { at, .. } | Self::Spied { at, .. } => *at,
        }
    }
}

/// Everything shared between players.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    /// World seed for galaxy generation and event draws.
    pub seed: u64,
    /// NPC planets created so far.
    pub npcs: BTreeMap<Coordinates, NpcState>,
    /// NPC fleets in flight.
    pub npc_missions: Vec<NpcFleetMission>,
    /// Debris fields by slot.
    pub debris: BTreeMap<Coordinates, DebrisField>,
    /// Player-claimed slots.
    pub planets: BTreeMap<Coordinates, PlanetRecord>,
    /// Pending cross-player reports by victim.
    pub inbox: BTreeMap<PlayerId, Vec<InboundReport>>,
}

impl GlobalState {
    /// An empty galaxy with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Whether a slot is claimed by any player.
    pub fn is_claimed(&self, coords: &Coordinates) -> bool {
        self.planets.contains_key(coords)
    }
}
