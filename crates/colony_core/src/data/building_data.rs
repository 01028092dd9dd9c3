//! Building catalog entries.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceCost;
use crate::kinds::UnitKind;
use crate::tech::TechId;

/// Static stats for one building kind.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     name: "Barracks",
///     hp_max: 300,
///     cost: (sucrose: 100, wood: 100),
///     construction_time: 600,
///     vision_range: 9,
///     size_px: 256.0,
///     produces: [Fighter],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Display name.
    pub name: String,

    /// Maximum health points.
    pub hp_max: u32,

    /// Price paid when construction is ordered.
    #[serde(default)]
    pub cost: ResourceCost,

    /// Ticks a construction site needs before this building appears.
    #[serde(default)]
    pub construction_time: u32,

    /// Vision radius in tiles.
    pub vision_range: u32,

    /// Side length of the square footprint in pixels.
    pub size_px: f64,

    /// Unit kinds this building can queue.
    #[serde(default)]
    pub produces: Vec<UnitKind>,

    /// Techs this building can research.
    #[serde(default)]
    pub researches: Vec<TechId>,

    /// Whether units collide with the footprint.
    #[serde(default = "default_true")]
    pub collision: bool,
}

const fn default_true() -> bool {
    true
}

impl BuildingData {
    /// Whether this building can queue a unit kind.
    #[must_use]
    pub fn can_produce(&self, unit: UnitKind) -> bool {
        self.produces.contains(&unit)
    }

    /// Whether this building can research a tech.
    #[must_use]
    pub fn can_research(&self, tech: &TechId) -> bool {
        self.researches.contains(tech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_parsing() {
        let data: BuildingData = ron::from_str(
            r#"BuildingData(
                name: "Barracks",
                hp_max: 300,
                cost: (sucrose: 100, wood: 100),
                construction_time: 600,
                vision_range: 9,
                size_px: 256.0,
                produces: [Fighter],
            )"#,
        )
        .unwrap();
        assert!(data.collision);
        assert!(data.researches.is_empty());
        assert!(data.can_produce(UnitKind::Fighter));
        assert!(!data.can_produce(UnitKind::Worker));
    }
}
