//! Closed sets of unit, building and tile types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::economy::ResourceKind;

/// Unit types known to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Ant gatherer.
    Worker,
    /// Ant leader used by scripted scenes.
    RoyalAnt,
    /// Ant combat unit, produced at barracks.
    Fighter,
    /// Roach gatherer.
    Roach,
    /// Roach leader used by scripted scenes.
    RoyalRoach,
}

impl UnitKind {
    /// All unit kinds in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Worker,
        Self::RoyalAnt,
        Self::Fighter,
        Self::Roach,
        Self::RoyalRoach,
    ];

    /// Whether this unit gathers resources.
    #[must_use]
    pub const fn is_worker(self) -> bool {
        matches!(self, Self::Worker | Self::Roach)
    }

    /// Display name used in notifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Worker => "Ant",
            Self::RoyalAnt => "Royal Ant",
            Self::Fighter => "Fighter",
            Self::Roach => "Roach",
            Self::RoyalRoach => "Royal Roach",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Building types known to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Placeholder that turns into its target when finished.
    InConstruction,
    /// Ant home: accepts deliveries, produces workers and research.
    AntHive,
    /// Produces fighters.
    Barracks,
    /// Roach home.
    RoachHive,
    /// Walkable span with no collision.
    Bridge,
}

impl BuildingKind {
    /// All building kinds in declaration order.
    pub const ALL: [Self; 5] = [
        Self::InConstruction,
        Self::AntHive,
        Self::Barracks,
        Self::RoachHive,
        Self::Bridge,
    ];

    /// Whether workers deliver resources here.
    #[must_use]
    pub const fn is_home(self) -> bool {
        matches!(self, Self::AntHive | Self::RoachHive)
    }

    /// Whether this kind owns a production queue.
    #[must_use]
    pub const fn is_producer(self) -> bool {
        matches!(self, Self::AntHive | Self::RoachHive | Self::Barracks)
    }

    /// Whether a worker may place this kind through a construction order.
    #[must_use]
    pub const fn is_constructible(self) -> bool {
        matches!(self, Self::Barracks | Self::Bridge)
    }

    /// Display name used in notifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InConstruction => "Construction Site",
            Self::AntHive => "Ant Hive",
            Self::Barracks => "Barracks",
            Self::RoachHive => "Roach Hive",
            Self::Bridge => "Bridge",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ground type of one map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// Bare ground.
    #[default]
    Plain,
    /// Sugar deposit.
    Sucrose,
    /// Timber deposit.
    Wood,
}

impl TileKind {
    /// Resource harvested from this tile, if any.
    #[must_use]
    pub const fn resource(self) -> Option<ResourceKind> {
        match self {
            Self::Plain => None,
            Self::Sucrose => Some(ResourceKind::Sucrose),
            Self::Wood => Some(ResourceKind::Wood),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_classification() {
        assert!(UnitKind::Worker.is_worker());
        assert!(UnitKind::Roach.is_worker());
        assert!(!UnitKind::Fighter.is_worker());
        assert!(!UnitKind::RoyalAnt.is_worker());
    }

    #[test]
    fn test_homes_and_producers() {
        assert!(BuildingKind::AntHive.is_home());
        assert!(BuildingKind::RoachHive.is_home());
        assert!(!BuildingKind::Barracks.is_home());
        assert!(BuildingKind::Barracks.is_producer());
        assert!(!BuildingKind::Bridge.is_producer());
        assert!(!BuildingKind::InConstruction.is_producer());
    }

    #[test]
    fn test_tile_resources() {
        assert_eq!(TileKind::Plain.resource(), None);
        assert_eq!(TileKind::Sucrose.resource(), Some(ResourceKind::Sucrose));
        assert_eq!(TileKind::Wood.resource(), Some(ResourceKind::Wood));
    }
}
