//! Static game content: costs, build times, prerequisites, combat and drive
//! stats, production and storage curves.
//!
//! Everything downstream reads content through the [`GameCatalog`] trait so
//! that tests can substitute fixed numbers. [`StandardCatalog`] carries the
//! shipped tuning: exponential leveled costs, linear unit costs, and
//! `level * 1.1^level` mine curves.
//!
//! Every lookup is keyed by the closed [`EntityId`] union and resolved with a
//! `match`.

use nova_types::{
    BuildingLevels, BuildingType, CombatUnit, DefenseType, EntityId, Fleet, Requirement,
    ResearchType, Resources, ShipType, count_of,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Convert a catalog float to a decimal quantity. Non-finite or negative
/// inputs become zero.
pub fn to_decimal(value: f64) -> Decimal {
    if !value.is_finite() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::MAX)
}

/// Convert a decimal quantity to a float for formula work.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Base combat values of one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatStats {
    /// Weapon strength.
    pub attack: f64,
    /// Shield strength.
    pub shield: f64,
    /// Structural integrity.
    pub hull: f64,
}

/// Propulsion family of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    /// Boosted 10% per combustion drive level.
    Combustion,
    /// Boosted 20% per impulse drive level.
    Impulse,
    /// Boosted 30% per hyperspace drive level.
    Hyperspace,
}

impl Drive {
    /// The research that improves this drive.
    pub const fn research(self) -> ResearchType {
        match self {
            Self::Combustion => ResearchType::CombustionDrive,
            Self::Impulse => ResearchType::ImpulseDrive,
            Self::Hyperspace => ResearchType::HyperspaceDrive,
        }
    }

    /// Fractional speed bonus per research level.
    pub const fn bonus_per_level(self) -> f64 {
        match self {
            Self::Combustion => 0.1,
            Self::Impulse => 0.2,
            Self::Hyperspace => 0.3,
        }
    }
}

/// Movement and logistics values of a ship hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipStats {
    /// Base speed.
    pub speed: f64,
    /// Propulsion family.
    pub drive: Drive,
    /// Cargo capacity in resource units.
    pub cargo: f64,
    /// Deuterium burned per ship over a reference distance.
    pub fuel: f64,
}

/// Pure lookup service over all game content.
pub trait GameCatalog: Send + Sync {
    /// Cost of a leveled entity at `level`, or of `amount` countable units.
    fn cost(&self, entity: EntityId, level_or_amount: u32) -> Resources;

    /// Cost of raising a ship type's upgrade tier to `tier`.
    fn upgrade_cost(&self, ship: ShipType, tier: u32) -> Resources;

    /// Seconds to build a leveled entity's `level`, or `amount` countable units.
    fn build_time_secs(
        &self,
        entity: EntityId,
        level_or_amount: u32,
        buildings: &BuildingLevels,
    ) -> u64;

    /// Seconds to raise a ship type's upgrade tier to `tier`.
    fn upgrade_time_secs(&self, ship: ShipType, tier: u32, buildings: &BuildingLevels) -> u64;

    /// Prerequisites of an entity.
    fn requirements(&self, entity: EntityId) -> Vec<Requirement>;

    /// Base combat values of a ship or defense.
    fn combat_stats(&self, unit: CombatUnit) -> CombatStats;

    /// Drive, speed, cargo and fuel of a ship.
    fn ship_stats(&self, ship: ShipType) -> ShipStats;

    /// Hourly output of a mine at `level` before efficiency and modifiers.
    fn base_production(&self, building: BuildingType, level: u32) -> f64;

    /// Energy produced by a building at `level`.
    fn energy_production(&self, building: BuildingType, level: u32, energy_tech: u32) -> f64;

    /// Energy consumed by a building at `level`.
    fn energy_consumption(&self, building: BuildingType, level: u32) -> f64;

    /// Capacity of one storage building at `level`.
    fn storage_capacity(&self, level: u32) -> f64;
}

/// Metal plus crystal plus deuterium cost of a set of ships, as a float.
pub fn fleet_value(catalog: &dyn GameCatalog, fleet: &Fleet) -> f64 {
    fleet
        .iter()
        .map(|(ship, count)| to_f64(catalog.cost(EntityId::Ship(*ship), *count).total()))
        .sum()
}

/// Total cargo capacity of a set of ships.
pub fn fleet_cargo(catalog: &dyn GameCatalog, fleet: &Fleet) -> f64 {
    fleet
        .iter()
        .map(|(ship, count)| catalog.ship_stats(*ship).cargo * f64::from(*count))
        .sum()
}

/// Whether `requirements` hold for the given levels.
pub fn requirements_met(
    requirements: &[Requirement],
    buildings: &BuildingLevels,
    research: &nova_types::ResearchLevels,
) -> bool {
    requirements.iter().all(|req| match *req {
        Requirement::Building {
            building,
            min_level,
        } => count_of(buildings, &building) >= min_level,
        Requirement::Research {
            research: tech,
            min_level,
        } => count_of(research, &tech) >= min_level,
    })
}

// ---------------------------------------------------------------------------
// Standard tables
// ---------------------------------------------------------------------------

const fn bld(building: BuildingType, min_level: u32) -> Requirement {
    Requirement::Building {
        building,
        min_level,
    }
}

const fn res(research: ResearchType, min_level: u32) -> Requirement {
    Requirement::Research {
        research,
        min_level,
    }
}

/// The shipped content tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCatalog;

impl StandardCatalog {
    /// Level-1 cost and growth factor of a building.
    const fn building_base(building: BuildingType) -> ([f64; 3], f64) {
        match building {
            BuildingType::MetalMine => ([60.0, 15.0, 0.0], 1.5),
            BuildingType::CrystalMine => ([48.0, 24.0, 0.0], 1.6),
            BuildingType::DeuteriumSynthesizer => ([225.0, 75.0, 0.0], 1.5),
            BuildingType::SolarPlant => ([75.0, 30.0, 0.0], 1.5),
            BuildingType::FusionReactor => ([900.0, 360.0, 180.0], 1.8),
            BuildingType::RoboticsFactory => ([400.0, 120.0, 200.0], 2.0),
            BuildingType::NaniteFactory => ([1_000_000.0, 500_000.0, 100_000.0], 2.0),
            BuildingType::Shipyard => ([400.0, 200.0, 100.0], 2.0),
            BuildingType::ResearchLab => ([200.0, 400.0, 200.0], 2.0),
            BuildingType::MetalStorage => ([1000.0, 0.0, 0.0], 2.0),
            BuildingType::CrystalStorage => ([1000.0, 500.0, 0.0], 2.0),
            BuildingType::DeuteriumTank => ([1000.0, 1000.0, 0.0], 2.0),
        }
    }

    /// Level-1 cost and growth factor of a research.
    const fn research_base(research: ResearchType) -> ([f64; 3], f64) {
        match research {
            ResearchType::EnergyTechnology => ([0.0, 800.0, 400.0], 2.0),
            ResearchType::LaserTechnology => ([200.0, 100.0, 0.0], 2.0),
            ResearchType::IonTechnology => ([1000.0, 300.0, 100.0], 2.0),
            ResearchType::HyperspaceTechnology => ([0.0, 4000.0, 2000.0], 2.0),
            ResearchType::PlasmaTechnology => ([2000.0, 4000.0, 1000.0], 2.0),
            ResearchType::CombustionDrive => ([400.0, 0.0, 600.0], 2.0),
            ResearchType::ImpulseDrive => ([2000.0, 4000.0, 600.0], 2.0),
            ResearchType::HyperspaceDrive => ([10_000.0, 20_000.0, 6000.0], 2.0),
            ResearchType::EspionageTechnology => ([200.0, 1000.0, 200.0], 2.0),
            ResearchType::ComputerTechnology => ([0.0, 400.0, 600.0], 2.0),
            ResearchType::Astrophysics => ([4000.0, 8000.0, 4000.0], 1.75),
            ResearchType::WeaponsTechnology => ([800.0, 200.0, 0.0], 2.0),
            ResearchType::ShieldingTechnology => ([200.0, 600.0, 0.0], 2.0),
            ResearchType::ArmourTechnology => ([1000.0, 0.0, 0.0], 2.0),
        }
    }

    /// Per-unit cost of a ship.
    const fn ship_base(ship: ShipType) -> [f64; 3] {
        match ship {
            ShipType::SmallCargo => [2000.0, 2000.0, 0.0],
            ShipType::LargeCargo => [6000.0, 6000.0, 0.0],
            ShipType::LightFighter => [3000.0, 1000.0, 0.0],
            ShipType::HeavyFighter => [6000.0, 4000.0, 0.0],
            ShipType::Cruiser => [20_000.0, 7000.0, 2000.0],
            ShipType::Battleship => [45_000.0, 15_000.0, 0.0],
            ShipType::Battlecruiser => [30_000.0, 40_000.0, 15_000.0],
            ShipType::Bomber => [50_000.0, 25_000.0, 15_000.0],
            ShipType::Destroyer => [60_000.0, 50_000.0, 15_000.0],
            ShipType::Deathstar => [5_000_000.0, 4_000_000.0, 1_000_000.0],
            ShipType::Recycler => [10_000.0, 6000.0, 2000.0],
            ShipType::EspionageProbe => [0.0, 1000.0, 0.0],
            ShipType::ColonyShip => [10_000.0, 20_000.0, 10_000.0],
        }
    }

    /// Per-unit cost of a defense.
    const fn defense_base(defense: DefenseType) -> [f64; 3] {
        match defense {
            DefenseType::RocketLauncher => [2000.0, 0.0, 0.0],
            DefenseType::LightLaser => [1500.0, 500.0, 0.0],
            DefenseType::HeavyLaser => [6000.0, 2000.0, 0.0],
            DefenseType::GaussCannon => [20_000.0, 15_000.0, 2000.0],
            DefenseType::IonCannon => [5000.0, 3000.0, 0.0],
            DefenseType::PlasmaTurret => [50_000.0, 50_000.0, 30_000.0],
            DefenseType::SmallShieldDome => [10_000.0, 10_000.0, 0.0],
            DefenseType::LargeShieldDome => [50_000.0, 50_000.0, 0.0],
        }
    }

    fn bundle(base: [f64; 3], factor: f64) -> Resources {
        let [metal, crystal, deuterium] = base;
        Resources::new(
            to_decimal(metal * factor).floor(),
            to_decimal(crystal * factor).floor(),
            to_decimal(deuterium * factor).floor(),
        )
    }

    fn growth(factor: f64, level: u32) -> f64 {
        factor.powf(f64::from(level.saturating_sub(1)))
    }

    /// Whole seconds, at least one. Saturates for absurd inputs.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn seconds_from_hours(hours: f64) -> u64 {
        let secs = (hours * 3600.0).ceil();
        if secs.is_finite() && secs >= 1.0 {
            secs as u64
        } else {
            1
        }
    }

    fn construction_divisor(buildings: &BuildingLevels, workshop: BuildingType) -> f64 {
        let workshop_level = f64::from(count_of(buildings, &workshop));
        let nanite = count_of(buildings, &BuildingType::NaniteFactory);
        2500.0 * (1.0 + workshop_level) * 2_f64.powf(f64::from(nanite))
    }
}

impl GameCatalog for StandardCatalog {
    fn cost(&self, entity: EntityId, level_or_amount: u32) -> Resources {
        let n = level_or_amount;
        match entity {
            EntityId::Building(b) => {
                let (base, factor) = Self::building_base(b);
                Self::bundle(base, Self::growth(factor, n))
            }
            EntityId::Research(r) => {
                let (base, factor) = Self::research_base(r);
                Self::bundle(base, Self::growth(factor, n))
            }
            EntityId::Ship(s) => Self::bundle(Self::ship_base(s), f64::from(n)),
            EntityId::Defense(d) => Self::bundle(Self::defense_base(d), f64::from(n)),
        }
    }

    fn upgrade_cost(&self, ship: ShipType, tier: u32) -> Resources {
        Self::bundle(Self::ship_base(ship), 5.0 * Self::growth(2.0, tier))
    }

    fn build_time_secs(
        &self,
        entity: EntityId,
        level_or_amount: u32,
        buildings: &BuildingLevels,
    ) -> u64 {
        let cost = self.cost(entity, level_or_amount);
        let structural = to_f64(cost.metal) + to_f64(cost.crystal);
        let hours = match entity {
            EntityId::Building(_) => {
                structural / Self::construction_divisor(buildings, BuildingType::RoboticsFactory)
            }
            EntityId::Research(_) => {
                let lab = f64::from(count_of(buildings, &BuildingType::ResearchLab));
                structural / (1000.0 * (1.0 + lab))
            }
            EntityId::Ship(_) | EntityId::Defense(_) => {
                structural / Self::construction_divisor(buildings, BuildingType::Shipyard)
            }
        };
        Self::seconds_from_hours(hours)
    }

    fn upgrade_time_secs(&self, ship: ShipType, tier: u32, buildings: &BuildingLevels) -> u64 {
        let cost = self.upgrade_cost(ship, tier);
        let lab = f64::from(count_of(buildings, &BuildingType::ResearchLab));
        Self::seconds_from_hours(
            (to_f64(cost.metal) + to_f64(cost.crystal)) / (1000.0 * (1.0 + lab)),
        )
    }

    fn requirements(&self, entity: EntityId) -> Vec<Requirement> {
        use BuildingType as B;
        use ResearchType as R;
        match entity {
            EntityId::Building(b) => match b {
                B::FusionReactor => vec![
                    bld(B::DeuteriumSynthesizer, 5),
                    res(R::EnergyTechnology, 3),
                ],
                B::NaniteFactory => vec![
                    bld(B::RoboticsFactory, 10),
                    res(R::ComputerTechnology, 10),
                ],
                B::Shipyard => vec![bld(B::RoboticsFactory, 2)],
                _ => Vec::new(),
            },
            EntityId::Research(r) => {
                let (lab, mut extra) = match r {
                    R::EnergyTechnology | R::ComputerTechnology => (1, Vec::new()),
                    R::LaserTechnology => (1, vec![res(R::EnergyTechnology, 2)]),
                    R::IonTechnology => (
                        4,
                        vec![res(R::LaserTechnology, 5), res(R::EnergyTechnology, 4)],
                    ),
                    R::HyperspaceTechnology => (
                        7,
                        vec![res(R::EnergyTechnology, 5), res(R::ShieldingTechnology, 5)],
                    ),
                    R::PlasmaTechnology => (
                        4,
                        vec![
                            res(R::EnergyTechnology, 8),
                            res(R::LaserTechnology, 10),
                            res(R::IonTechnology, 5),
                        ],
                    ),
                    R::CombustionDrive => (1, vec![res(R::EnergyTechnology, 1)]),
                    R::ImpulseDrive => (2, vec![res(R::EnergyTechnology, 1)]),
                    R::HyperspaceDrive => (7, vec![res(R::HyperspaceTechnology, 3)]),
                    R::EspionageTechnology => (3, Vec::new()),
                    R::Astrophysics => (
                        3,
                        vec![res(R::EspionageTechnology, 4), res(R::ImpulseDrive, 3)],
                    ),
                    R::WeaponsTechnology => (4, Vec::new()),
                    R::ShieldingTechnology => (6, vec![res(R::EnergyTechnology, 3)]),
                    R::ArmourTechnology => (2, Vec::new()),
                };
                extra.insert(0, bld(B::ResearchLab, lab));
                extra
            }
            EntityId::Ship(s) => match s {
                ShipType::SmallCargo => vec![bld(B::Shipyard, 2), res(R::CombustionDrive, 2)],
                ShipType::LargeCargo => vec![bld(B::Shipyard, 4), res(R::CombustionDrive, 6)],
                ShipType::LightFighter => vec![bld(B::Shipyard, 1), res(R::CombustionDrive, 1)],
                ShipType::HeavyFighter => vec![
                    bld(B::Shipyard, 3),
                    res(R::ArmourTechnology, 2),
                    res(R::ImpulseDrive, 2),
                ],
                ShipType::Cruiser => vec![
                    bld(B::Shipyard, 5),
                    res(R::ImpulseDrive, 4),
                    res(R::IonTechnology, 2),
                ],
                ShipType::Battleship => vec![bld(B::Shipyard, 7), res(R::HyperspaceDrive, 4)],
                ShipType::Battlecruiser => vec![
                    bld(B::Shipyard, 8),
                    res(R::HyperspaceTechnology, 5),
                    res(R::LaserTechnology, 12),
                    res(R::HyperspaceDrive, 5),
                ],
                ShipType::Bomber => vec![
                    bld(B::Shipyard, 8),
                    res(R::ImpulseDrive, 6),
                    res(R::PlasmaTechnology, 5),
                ],
                ShipType::Destroyer => vec![
                    bld(B::Shipyard, 9),
                    res(R::HyperspaceDrive, 6),
                    res(R::HyperspaceTechnology, 5),
                ],
                ShipType::Deathstar => vec![
                    bld(B::Shipyard, 12),
                    res(R::HyperspaceDrive, 7),
                    res(R::HyperspaceTechnology, 6),
                ],
                ShipType::Recycler => vec![
                    bld(B::Shipyard, 4),
                    res(R::CombustionDrive, 6),
                    res(R::ShieldingTechnology, 2),
                ],
                ShipType::EspionageProbe => vec![
                    bld(B::Shipyard, 3),
                    res(R::CombustionDrive, 3),
                    res(R::EspionageTechnology, 2),
                ],
                ShipType::ColonyShip => vec![bld(B::Shipyard, 4), res(R::ImpulseDrive, 3)],
            },
            EntityId::Defense(d) => match d {
                DefenseType::RocketLauncher => vec![bld(B::Shipyard, 1)],
                DefenseType::LightLaser => vec![
                    bld(B::Shipyard, 2),
                    res(R::EnergyTechnology, 1),
                    res(R::LaserTechnology, 3),
                ],
                DefenseType::HeavyLaser => vec![
                    bld(B::Shipyard, 4),
                    res(R::EnergyTechnology, 3),
                    res(R::LaserTechnology, 6),
                ],
                DefenseType::GaussCannon => vec![
                    bld(B::Shipyard, 6),
                    res(R::EnergyTechnology, 6),
                    res(R::WeaponsTechnology, 3),
                    res(R::ShieldingTechnology, 1),
                ],
                DefenseType::IonCannon => vec![bld(B::Shipyard, 4), res(R::IonTechnology, 4)],
                DefenseType::PlasmaTurret => {
                    vec![bld(B::Shipyard, 8), res(R::PlasmaTechnology, 7)]
                }
                DefenseType::SmallShieldDome => {
                    vec![bld(B::Shipyard, 1), res(R::ShieldingTechnology, 2)]
                }
                DefenseType::LargeShieldDome => {
                    vec![bld(B::Shipyard, 6), res(R::ShieldingTechnology, 6)]
                }
            },
        }
    }

    fn combat_stats(&self, unit: CombatUnit) -> CombatStats {
        let (attack, shield, hull) = match unit {
            CombatUnit::Ship(s) => match s {
                ShipType::SmallCargo => (5.0, 10.0, 4000.0),
                ShipType::LargeCargo => (5.0, 25.0, 12_000.0),
                ShipType::LightFighter => (50.0, 10.0, 4000.0),
                ShipType::HeavyFighter => (150.0, 25.0, 10_000.0),
                ShipType::Cruiser => (400.0, 50.0, 27_000.0),
                ShipType::Battleship => (1000.0, 200.0, 60_000.0),
                ShipType::Battlecruiser => (700.0, 400.0, 70_000.0),
                ShipType::Bomber => (1000.0, 500.0, 75_000.0),
                ShipType::Destroyer => (2000.0, 500.0, 110_000.0),
                ShipType::Deathstar => (200_000.0, 50_000.0, 9_000_000.0),
                ShipType::Recycler => (1.0, 10.0, 16_000.0),
                ShipType::EspionageProbe => (0.0, 0.0, 1000.0),
                ShipType::ColonyShip => (50.0, 100.0, 30_000.0),
            },
            CombatUnit::Defense(d) => match d {
                DefenseType::RocketLauncher => (80.0, 20.0, 2000.0),
                DefenseType::LightLaser => (100.0, 25.0, 2000.0),
                DefenseType::HeavyLaser => (250.0, 100.0, 8000.0),
                DefenseType::GaussCannon => (1100.0, 200.0, 35_000.0),
                DefenseType::IonCannon => (150.0, 500.0, 8000.0),
                DefenseType::PlasmaTurret => (3000.0, 300.0, 100_000.0),
                DefenseType::SmallShieldDome => (1.0, 2000.0, 20_000.0),
                DefenseType::LargeShieldDome => (1.0, 10_000.0, 100_000.0),
            },
        };
        CombatStats {
            attack,
            shield,
            hull,
        }
    }

    fn ship_stats(&self, ship: ShipType) -> ShipStats {
        let (speed, drive, cargo, fuel) = match ship {
            ShipType::SmallCargo => (5000.0, Drive::Combustion, 5000.0, 10.0),
            ShipType::LargeCargo => (7500.0, Drive::Combustion, 25_000.0, 50.0),
            ShipType::LightFighter => (12_500.0, Drive::Combustion, 50.0, 20.0),
            ShipType::HeavyFighter => (10_000.0, Drive::Impulse, 100.0, 75.0),
            ShipType::Cruiser => (15_000.0, Drive::Impulse, 800.0, 300.0),
            ShipType::Battleship => (10_000.0, Drive::Hyperspace, 1500.0, 500.0),
            ShipType::Battlecruiser => (10_000.0, Drive::Hyperspace, 750.0, 250.0),
            ShipType::Bomber => (4000.0, Drive::Impulse, 500.0, 700.0),
            ShipType::Destroyer => (5000.0, Drive::Hyperspace, 2000.0, 1000.0),
            ShipType::Deathstar => (100.0, Drive::Hyperspace, 1_000_000.0, 1.0),
            ShipType::Recycler => (2000.0, Drive::Combustion, 20_000.0, 300.0),
            ShipType::EspionageProbe => (100_000_000.0, Drive::Combustion, 5.0, 1.0),
            ShipType::ColonyShip => (2500.0, Drive::Impulse, 7500.0, 1000.0),
        };
        ShipStats {
            speed,
            drive,
            cargo,
            fuel,
        }
    }

    fn base_production(&self, building: BuildingType, level: u32) -> f64 {
        let coefficient = match building {
            BuildingType::MetalMine => 30.0,
            BuildingType::CrystalMine => 20.0,
            BuildingType::DeuteriumSynthesizer => 10.0,
            _ => return 0.0,
        };
        let l = f64::from(level);
        coefficient * l * 1.1_f64.powf(l)
    }

    fn energy_production(&self, building: BuildingType, level: u32, energy_tech: u32) -> f64 {
        let l = f64::from(level);
        match building {
            BuildingType::SolarPlant => 20.0 * l * 1.1_f64.powf(l),
            BuildingType::FusionReactor => {
                30.0 * l * (1.05 + 0.01 * f64::from(energy_tech)).powf(l)
            }
            _ => 0.0,
        }
    }

    fn energy_consumption(&self, building: BuildingType, level: u32) -> f64 {
        let coefficient = match building {
            BuildingType::MetalMine | BuildingType::CrystalMine => 10.0,
            BuildingType::DeuteriumSynthesizer => 20.0,
            _ => return 0.0,
        };
        let l = f64::from(level);
        coefficient * l * 1.1_f64.powf(l)
    }

    fn storage_capacity(&self, level: u32) -> f64 {
        5000.0 * (2.5 * (20.0 * f64::from(level) / 33.0).exp()).floor()
    }
}
