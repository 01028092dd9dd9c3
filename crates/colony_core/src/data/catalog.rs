//! The immutable stat catalog handed to the simulation at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BuildingData, Tech, UnitData};
use crate::economy::ResourceCost;
use crate::error::{GameError, Result};
use crate::kinds::{BuildingKind, UnitKind};
use crate::tech::TechId;

/// Unit, building and tech definitions.
///
/// Built once (from RON or [`Catalog::default`]) and shared read-only by
/// every factory call. Lookups are keyed by kind, never by string.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     units: { Worker: UnitData(...), Fighter: UnitData(...) },
///     buildings: { AntHive: BuildingData(...) },
///     technologies: [Tech(...)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Stats per unit kind.
    pub units: BTreeMap<UnitKind, UnitData>,

    /// Stats per building kind.
    pub buildings: BTreeMap<BuildingKind, BuildingData>,

    /// Every researchable tech.
    #[serde(default)]
    pub technologies: Vec<Tech>,
}

impl Catalog {
    /// Parse a catalog from RON text and validate its references.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed text and
    /// [`GameError::InvalidCatalog`] for dangling references.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(text).map_err(|source| GameError::DataParseError {
            what: "catalog",
            source,
        })?;
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidCatalog(errors));
        }
        Ok(catalog)
    }

    /// Stats for a unit kind.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingUnitData`] if the kind is absent.
    pub fn unit(&self, kind: UnitKind) -> Result<&UnitData> {
        self.units.get(&kind).ok_or(GameError::MissingUnitData(kind))
    }

    /// Stats for a building kind.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingBuildingData`] if the kind is absent.
    pub fn building(&self, kind: BuildingKind) -> Result<&BuildingData> {
        self.buildings
            .get(&kind)
            .ok_or(GameError::MissingBuildingData(kind))
    }

    /// Look up a tech definition.
    #[must_use]
    pub fn tech(&self, id: &TechId) -> Option<&Tech> {
        self.technologies.iter().find(|t| &t.id == id)
    }

    /// Check cross references.
    ///
    /// Returns a list of problems; empty means the catalog is consistent.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (kind, unit) in &self.units {
            if let Some(tech) = &unit.tech_required {
                if self.tech(tech).is_none() {
                    errors.push(format!("Unit {kind:?} requires unknown tech '{tech}'"));
                }
            }
            if unit.size_px <= 0.0 {
                errors.push(format!("Unit {kind:?} has non-positive size"));
            }
        }

        for (kind, building) in &self.buildings {
            for unit in &building.produces {
                if !self.units.contains_key(unit) {
                    errors.push(format!("Building {kind:?} produces unknown unit {unit:?}"));
                }
            }
            for tech in &building.researches {
                if self.tech(tech).is_none() {
                    errors.push(format!("Building {kind:?} researches unknown tech '{tech}'"));
                }
            }
        }

        for tech in &self.technologies {
            for dep in &tech.dependencies {
                if self.tech(dep).is_none() {
                    errors.push(format!("Tech '{}' depends on unknown tech '{dep}'", tech.id));
                }
            }
        }

        if !self.buildings.contains_key(&BuildingKind::InConstruction) {
            errors.push("Missing InConstruction building data".to_string());
        }

        errors
    }
}

impl Default for Catalog {
    /// The shipped stat tables.
    fn default() -> Self {
        let worker = UnitData {
            name: "Ant".to_string(),
            hp_max: 100,
            move_speed: 10.0,
            size_px: 64.0,
            damage: 10,
            attack_range: 40.0,
            attack_frames: 30,
            max_carry_capacity: 5,
            construction_time: 300,
            cost: ResourceCost::new(50, 0),
            vision_range: 4,
            tech_required: None,
        };
        let royal = UnitData {
            name: "Royal Ant".to_string(),
            hp_max: 300,
            size_px: 128.0,
            max_carry_capacity: 0,
            ..worker.clone()
        };
        let fighter = UnitData {
            name: "Fighter".to_string(),
            hp_max: 150,
            move_speed: 12.0,
            damage: 20,
            attack_range: 60.0,
            max_carry_capacity: 0,
            construction_time: 450,
            cost: ResourceCost::new(100, 0),
            vision_range: 5,
            tech_required: Some(TechId::BUILD_FIGHTER),
            ..worker.clone()
        };

        let units = BTreeMap::from([
            (UnitKind::Worker, worker.clone()),
            (UnitKind::RoyalAnt, royal.clone()),
            (UnitKind::Fighter, fighter),
            (
                UnitKind::Roach,
                UnitData {
                    name: "Roach".to_string(),
                    ..worker
                },
            ),
            (
                UnitKind::RoyalRoach,
                UnitData {
                    name: "Royal Roach".to_string(),
                    ..royal
                },
            ),
        ]);

        let hive = BuildingData {
            name: "Ant Hive".to_string(),
            hp_max: 500,
            cost: ResourceCost::FREE,
            construction_time: 0,
            vision_range: 9,
            size_px: 256.0,
            produces: vec![UnitKind::Worker],
            researches: vec![TechId::FASTER_GATHERING],
            collision: true,
        };
        let buildings = BTreeMap::from([
            (
                BuildingKind::InConstruction,
                BuildingData {
                    name: "Construction Site".to_string(),
                    hp_max: 100,
                    produces: Vec::new(),
                    researches: Vec::new(),
                    ..hive.clone()
                },
            ),
            (
                BuildingKind::RoachHive,
                BuildingData {
                    name: "Roach Hive".to_string(),
                    produces: vec![UnitKind::Roach],
                    ..hive.clone()
                },
            ),
            (
                BuildingKind::Barracks,
                BuildingData {
                    name: "Barracks".to_string(),
                    hp_max: 300,
                    cost: ResourceCost::new(100, 100),
                    construction_time: 600,
                    produces: vec![UnitKind::Fighter],
                    researches: Vec::new(),
                    ..hive.clone()
                },
            ),
            (
                BuildingKind::Bridge,
                BuildingData {
                    name: "Bridge".to_string(),
                    hp_max: 200,
                    cost: ResourceCost::new(0, 50),
                    construction_time: 160,
                    size_px: 128.0,
                    produces: Vec::new(),
                    researches: Vec::new(),
                    collision: false,
                    ..hive.clone()
                },
            ),
            (BuildingKind::AntHive, hive),
        ]);

        let technologies = vec![
            Tech {
                id: TechId::FASTER_GATHERING,
                name: "Faster Gathering".to_string(),
                description: "Workers collect resources 20% faster".to_string(),
                cost: ResourceCost::new(250, 0),
                research_seconds: 60,
                dependencies: Vec::new(),
            },
            Tech {
                id: TechId::BUILD_FIGHTER,
                name: "Build Fighter Unit".to_string(),
                description: "Unlocks the ability to build Fighter units".to_string(),
                cost: ResourceCost::FREE,
                research_seconds: 0,
                dependencies: Vec::new(),
            },
        ];

        Self {
            units,
            buildings,
            technologies,
        }
    }
}
