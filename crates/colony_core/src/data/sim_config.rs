//! Tunable simulation constants.

use serde::{Deserialize, Serialize};

use crate::components::Faction;
use crate::economy::PlayerEconomy;
use crate::error::{GameError, Result};

/// Simulation tunables.
///
/// Every field has a default, so a RON file only needs the values it
/// overrides.
///
/// # Example RON
///
/// ```ron
/// SimConfig(
///     starting_economy: (sucrose: 500, wood: 200),
///     harvest_frames: 20,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Side length of a map tile in pixels.
    pub tile_size: f64,

    /// Ticks per simulated second; converts research seconds to ticks.
    pub ticks_per_second: u32,

    /// Faction whose units and buildings reveal fog of war.
    pub player_faction: Faction,

    /// Stockpile every faction starts with.
    pub starting_economy: PlayerEconomy,

    /// Edge distance at which a waypoint counts as reached.
    pub arrival_threshold: f64,

    /// Displacement per tick below which a unit counts as stuck.
    pub stuck_epsilon: f64,

    /// Stuck ticks between backward nudges.
    pub stuck_nudge_interval: u32,

    /// Center distance within which other units push each other apart.
    pub repulsion_radius: f64,

    /// Weight of the repulsion vector relative to the goal direction.
    pub repulsion_weight: f64,

    /// Edge distance to the resource tile center within which harvesting proceeds.
    pub harvest_distance: f64,

    /// Ticks to fill a load without upgrades.
    pub harvest_frames: u32,

    /// Resources carried home per trip.
    pub harvest_amount: u32,

    /// Harvest time multiplier once faster gathering is unlocked.
    pub faster_gathering_factor: f64,

    /// Edge distance to the home center at which a load is delivered.
    pub deliver_range: f64,

    /// Max distance from a builder to the center of a construction site.
    pub builder_max_distance: f64,

    /// Radius of the arrival broadcast to friendly units.
    pub nearby_friend_radius: f64,

    /// Group orders wider than this are contracted toward their centroid.
    pub group_max_spread: f64,

    /// Nesting limit for re-entrant event publishes.
    pub max_event_depth: usize,

    /// Whether fog of war is recomputed each tick.
    pub fog_enabled: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 128.0,
            ticks_per_second: 60,
            player_faction: Faction::PLAYER,
            starting_economy: PlayerEconomy::new(9999, 0),
            arrival_threshold: 65.0,
            stuck_epsilon: 1.5,
            stuck_nudge_interval: 30,
            repulsion_radius: 160.0,
            repulsion_weight: 2.0,
            harvest_distance: 110.0,
            harvest_frames: 30,
            harvest_amount: 5,
            faster_gathering_factor: 0.8,
            deliver_range: 195.0,
            builder_max_distance: 340.0,
            nearby_friend_radius: 150.0,
            group_max_spread: 120.0,
            max_event_depth: 32,
            fog_enabled: true,
        }
    }
}

impl SimConfig {
    /// Parse a config from RON text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|source| GameError::DataParseError {
            what: "sim config",
            source,
        })
    }

    /// Half a tile in pixels.
    #[must_use]
    pub fn half_tile(&self) -> f64 {
        self.tile_size / 2.0
    }

    /// Harvest duration in ticks, with or without the gathering upgrade.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn harvest_ticks(&self, faster_gathering: bool) -> u32 {
        if faster_gathering {
            (f64::from(self.harvest_frames) * self.faster_gathering_factor) as u32
        } else {
            self.harvest_frames
        }
    }
}
