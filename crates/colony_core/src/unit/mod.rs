//! Units: live stats, geometry, and the behaviour state machine.
//!
//! A unit is always in exactly one [`UnitState`]. Each tick the simulation
//! calls the state's update, which may steer the unit, fight, harvest or
//! switch to another state through [`Unit::change_state`].
//!
//! References to other entities (`nearest_enemy`, `nearest_home`) are plain
//! ids. They are resolved against the simulation every time they are used
//! and may point at something that no longer exists.

mod state;
mod steering;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub use state::UnitState;

use crate::components::{EntityId, Faction};
use crate::data::UnitData;
use crate::economy::{ResourceCost, ResourceKind};
use crate::kinds::UnitKind;
use crate::math::{Rect, Vec2};

/// Live stats of one unit, instanced from its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Display name.
    pub name: String,
    /// Maximum health.
    pub hp_max: u32,
    /// Current health; the unit is dead at zero.
    pub hp_cur: u32,
    /// Pixels per tick.
    pub move_speed: f64,
    /// Side of the bounding box in pixels.
    pub size_px: f64,
    /// Damage per attack.
    pub damage: u32,
    /// Edge distance at which attacks land.
    pub attack_range: f64,
    /// Ticks between attacks.
    pub attack_frames: u32,
    /// Ticks accumulated toward the next attack.
    pub attack_frames_cur: u32,
    /// Load size per harvest trip.
    pub max_carry_capacity: u32,
    /// Resources currently carried.
    pub resources_carried: u32,
    /// Kind of the carried resources.
    pub resource_type_carried: Option<ResourceKind>,
    /// Production time in ticks.
    pub construction_time: u32,
    /// Production price.
    pub cost: ResourceCost,
    /// Vision radius in tiles.
    pub vision_range: u32,
}

impl UnitStats {
    /// Fresh stats at full health.
    #[must_use]
    pub fn from_data(data: &UnitData) -> Self {
        Self {
            name: data.name.clone(),
            hp_max: data.hp_max,
            hp_cur: data.hp_max,
            move_speed: data.move_speed,
            size_px: data.size_px,
            damage: data.damage,
            attack_range: data.attack_range,
            attack_frames: data.attack_frames,
            attack_frames_cur: 0,
            max_carry_capacity: data.max_carry_capacity,
            resources_carried: 0,
            resource_type_carried: None,
            construction_time: data.construction_time,
            cost: data.cost,
            vision_range: data.vision_range,
        }
    }
}

/// Messages one unit can send another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitMessage {
    /// The sender reached its goal; stop and idle, and pass it on.
    ArrivedIdle,
}

/// A mobile entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: EntityId,
    /// Unit type.
    pub kind: UnitKind,
    /// Owner.
    pub faction: Faction,
    /// Live stats.
    pub stats: UnitStats,
    /// Top-left corner in pixels.
    pub position: Vec2,
    /// Bounding box, kept in sync with `position`.
    pub rect: Rect,
    /// Waypoints; the front is the next one.
    pub destinations: VecDeque<Vec2>,
    /// Current behaviour.
    pub state: UnitState,
    /// Facing in radians; 0 points up the screen.
    pub moving_angle: f64,
    /// Current attack target.
    pub nearest_enemy: Option<EntityId>,
    /// Hive this unit delivers to.
    pub nearest_home: Option<EntityId>,
    /// Center of the resource tile being worked.
    pub last_resource_pos: Option<Vec2>,
    /// Consecutive ticks without meaningful movement.
    pub stuck_frames: u32,
}

impl Unit {
    /// Create an idle unit with its top-left corner at `position`.
    #[must_use]
    pub fn new(id: EntityId, kind: UnitKind, faction: Faction, data: &UnitData, position: Vec2) -> Self {
        Self {
            id,
            kind,
            faction,
            stats: UnitStats::from_data(data),
            position,
            rect: Rect::from_origin_size(position, data.size_px, data.size_px),
            destinations: VecDeque::new(),
            state: UnitState::Idle,
            moving_angle: 0.0,
            nearest_enemy: None,
            nearest_home: None,
            last_resource_pos: None,
            stuck_frames: 0,
        }
    }

    /// Whether the unit gathers resources.
    #[must_use]
    pub const fn is_worker(&self) -> bool {
        self.kind.is_worker()
    }

    /// Health above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.stats.hp_cur > 0
    }

    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Move the top-left corner, keeping the box in sync.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.rect = self.rect.moved_to(position);
    }

    /// Move so the box is centered on `center`.
    pub fn set_center(&mut self, center: Vec2) {
        let half = Vec2::new(self.rect.width() / 2.0, self.rect.height() / 2.0);
        self.set_position(center - half);
    }

    /// Distance from the center to `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f64 {
        self.center().distance(point)
    }

    /// Distance from the nearest edge of the box to `point`.
    #[must_use]
    pub fn edge_distance_to(&self, point: Vec2) -> f64 {
        self.rect.edge_distance_to(point)
    }

    /// Whether `point` is within attack range of the box.
    #[must_use]
    pub fn target_in_attack_range(&self, point: Vec2) -> bool {
        self.edge_distance_to(point) <= self.stats.attack_range
    }

    /// Range at which idle and attack-moving units notice enemies.
    #[must_use]
    pub fn aggro_range(&self, tile_size: f64) -> f64 {
        f64::from(self.stats.vision_range) * tile_size
    }

    /// Tile the center stands on, clamped to non-negative coordinates.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn tile_coords(&self, tile_size: f64) -> (i64, i64) {
        let center = self.center();
        (
            (center.x / tile_size).floor().max(0.0) as i64,
            (center.y / tile_size).floor().max(0.0) as i64,
        )
    }

    /// Subtract health, stopping at zero.
    pub fn take_damage(&mut self, amount: u32) {
        self.stats.hp_cur = self.stats.hp_cur.saturating_sub(amount);
    }

    /// Name of the current state.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// Leave the current state and enter `next`.
    pub fn change_state(&mut self, next: UnitState) {
        let previous = std::mem::replace(&mut self.state, UnitState::Idle);
        previous.exit(self);
        let mut next = next;
        next.enter(self);
        tracing::trace!(
            unit = self.id,
            from = previous.name(),
            to = next.name(),
            "unit state change"
        );
        self.state = next;
    }

    /// Drop all waypoints and idle.
    pub(crate) fn stop(&mut self) {
        self.destinations.clear();
        self.change_state(UnitState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Catalog;

    fn worker_at(x: f64, y: f64) -> Unit {
        let catalog = Catalog::default();
        Unit::new(
            1,
            UnitKind::Worker,
            Faction::PLAYER,
            catalog.unit(UnitKind::Worker).unwrap(),
            Vec2::new(x, y),
        )
    }

    #[test]
    fn test_new_unit_is_idle_at_full_health() {
        let unit = worker_at(0.0, 0.0);
        assert_eq!(unit.state, UnitState::Idle);
        assert_eq!(unit.stats.hp_cur, unit.stats.hp_max);
        assert_eq!(unit.rect.width(), 64.0);
        assert!(unit.is_worker());
    }

    #[test]
    fn test_set_center_moves_rect() {
        let mut unit = worker_at(0.0, 0.0);
        unit.set_center(Vec2::new(192.0, 64.0));
        assert_eq!(unit.position, Vec2::new(160.0, 32.0));
        assert_eq!(unit.rect.min, Vec2::new(160.0, 32.0));
        assert_eq!(unit.center(), Vec2::new(192.0, 64.0));
        assert_eq!(unit.tile_coords(128.0), (1, 0));
    }

    #[test]
    fn test_attack_range_uses_edge_distance() {
        let unit = worker_at(0.0, 0.0);
        assert!(unit.target_in_attack_range(Vec2::new(104.0, 32.0)));
        assert!(!unit.target_in_attack_range(Vec2::new(105.0, 32.0)));
    }

    #[test]
    fn test_take_damage_saturates() {
        let mut unit = worker_at(0.0, 0.0);
        unit.take_damage(250);
        assert_eq!(unit.stats.hp_cur, 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_change_state_runs_enter() {
        let mut unit = worker_at(0.0, 0.0);
        unit.stats.attack_frames_cur = 12;
        unit.change_state(UnitState::Attacking);
        assert_eq!(unit.stats.attack_frames_cur, 0);

        unit.destinations.push_back(Vec2::new(500.0, 0.0));
        unit.change_state(UnitState::Harvesting { timer: 9 });
        assert!(unit.destinations.is_empty());
        assert_eq!(unit.state, UnitState::Harvesting { timer: 0 });
    }
}
