//! Unit catalog entries.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceCost;
use crate::tech::TechId;

/// Static stats for one unit kind.
///
/// Instanced into a live [`UnitStats`](crate::unit::UnitStats) whenever a
/// unit of this kind spawns.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     name: "Fighter",
///     hp_max: 150,
///     move_speed: 12.0,
///     size_px: 64.0,
///     damage: 20,
///     attack_range: 60.0,
///     attack_frames: 30,
///     construction_time: 450,
///     cost: (sucrose: 100),
///     vision_range: 5,
///     tech_required: Some("build_fighter"),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Display name.
    pub name: String,

    /// Maximum health points.
    pub hp_max: u32,

    /// Pixels moved per tick.
    pub move_speed: f64,

    /// Side length of the square bounding box in pixels.
    pub size_px: f64,

    /// Damage dealt per attack.
    pub damage: u32,

    /// Edge distance in pixels at which the unit can attack.
    pub attack_range: f64,

    /// Ticks between attacks.
    pub attack_frames: u32,

    /// Resources carried per harvest trip.
    #[serde(default)]
    pub max_carry_capacity: u32,

    /// Production time in ticks.
    pub construction_time: u32,

    /// Price paid when queued.
    #[serde(default)]
    pub cost: ResourceCost,

    /// Vision radius in tiles.
    pub vision_range: u32,

    /// Tech that must be unlocked before this unit can be queued.
    #[serde(default)]
    pub tech_required: Option<TechId>,
}

impl UnitData {
    /// Whether the unit fights at all.
    #[must_use]
    pub fn is_combatant(&self) -> bool {
        self.damage > 0 && self.attack_frames > 0
    }
}
