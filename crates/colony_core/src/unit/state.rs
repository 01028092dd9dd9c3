//! Unit behaviour states and their per-tick updates.

use serde::{Deserialize, Serialize};

use super::Unit;
use crate::kinds::TileKind;
use crate::math::{facing_angle, rotate_toward};
use crate::simulation::Sim;
use crate::tech::TechId;

/// Max turn toward an attack target per tick, in radians.
const ATTACK_TURN_RATE: f64 = 0.1;

/// What a unit is doing. Exactly one at any time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitState {
    /// Standing still, watching for enemies.
    #[default]
    Idle,
    /// Walking the waypoint queue; enters `next` (or idles) when it empties.
    Moving {
        /// State to enter on arrival.
        next: Option<Box<UnitState>>,
    },
    /// Walking the waypoint queue but engaging any enemy in aggro range.
    AttackMove,
    /// Striking `nearest_enemy` on a fixed cadence.
    Attacking,
    /// Filling a load at `last_resource_pos`.
    Harvesting {
        /// Ticks spent on the current load.
        timer: u32,
    },
    /// Carrying a load to `nearest_home`.
    Delivering,
    /// Reserved for builders; does nothing yet.
    Constructing,
}

impl UnitState {
    /// Moving with a follow-up state.
    #[must_use]
    pub fn moving_then(next: Self) -> Self {
        Self::Moving {
            next: Some(Box::new(next)),
        }
    }

    /// Plain move order.
    #[must_use]
    pub const fn moving() -> Self {
        Self::Moving { next: None }
    }

    /// Lower-case state name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving { .. } => "moving",
            Self::AttackMove => "attackmove",
            Self::Attacking => "attacking",
            Self::Harvesting { .. } => "harvesting",
            Self::Delivering => "delivering",
            Self::Constructing => "constructing",
        }
    }

    /// Whether an arrival broadcast may stop a unit in this state.
    #[must_use]
    pub const fn is_interruptible(&self) -> bool {
        matches!(self, Self::Moving { next: None } | Self::AttackMove)
    }

    pub(super) fn enter(&mut self, unit: &mut Unit) {
        match self {
            Self::Attacking => unit.stats.attack_frames_cur = 0,
            Self::Harvesting { timer } => {
                *timer = 0;
                unit.destinations.clear();
            }
            Self::Idle
            | Self::Moving { .. }
            | Self::AttackMove
            | Self::Delivering
            | Self::Constructing => {}
        }
    }

    pub(super) fn exit(&self, unit: &mut Unit) {
        if matches!(self, Self::Attacking) {
            unit.stats.attack_frames_cur = 0;
        }
    }
}

impl Unit {
    /// Run one tick of the current state.
    pub(crate) fn update(&mut self, sim: &mut Sim) {
        match self.state.clone() {
            UnitState::Idle => self.update_idle(sim),
            UnitState::Moving { next } => self.update_moving(sim, next),
            UnitState::AttackMove => self.update_attack_move(sim),
            UnitState::Attacking => self.update_attacking(sim),
            UnitState::Harvesting { timer } => self.update_harvesting(sim, timer),
            UnitState::Delivering => self.update_delivering(sim),
            UnitState::Constructing => {}
        }
    }

    fn update_idle(&mut self, sim: &mut Sim) {
        let aggro = self.aggro_range(sim.config.tile_size);
        let Some((enemy, enemy_center)) = sim.nearest_enemy(self) else {
            return;
        };
        if self.edge_distance_to(enemy_center) > aggro {
            return;
        }

        self.nearest_enemy = Some(enemy);
        if self.target_in_attack_range(enemy_center) {
            self.change_state(UnitState::Attacking);
        } else {
            self.destinations.push_back(enemy_center);
            self.change_state(UnitState::moving_then(UnitState::Attacking));
        }
    }

    fn update_moving(&mut self, sim: &mut Sim, next: Option<Box<UnitState>>) {
        if next.as_deref() == Some(&UnitState::Attacking) && self.attack_target_in_range(sim) {
            self.destinations.clear();
            self.change_state(UnitState::Attacking);
            return;
        }

        self.move_to_destination(sim);
        if !self.destinations.is_empty() {
            return;
        }
        match next {
            Some(next) => self.change_state(*next),
            None => {
                self.change_state(UnitState::Idle);
                sim.broadcast_arrived_idle(self);
            }
        }
    }

    fn update_attack_move(&mut self, sim: &mut Sim) {
        let aggro = self.aggro_range(sim.config.tile_size);
        let target = sim
            .nearest_enemy(self)
            .filter(|(_, center)| self.edge_distance_to(*center) <= aggro);

        match target {
            Some((enemy, enemy_center)) => {
                self.nearest_enemy = Some(enemy);
                if self.target_in_attack_range(enemy_center) {
                    self.change_state(UnitState::Attacking);
                    return;
                }
                // Chase for one step without disturbing the order's waypoints.
                self.destinations.push_front(enemy_center);
                self.move_to_destination(sim);
                if let Some(i) = self.destinations.iter().position(|d| *d == enemy_center) {
                    self.destinations.remove(i);
                }
            }
            None => self.move_to_destination(sim),
        }

        if self.destinations.is_empty() {
            self.change_state(UnitState::Idle);
        }
    }

    /// Whether `nearest_enemy` is alive and already within attack range.
    fn attack_target_in_range(&self, sim: &Sim) -> bool {
        self.nearest_enemy
            .and_then(|id| sim.units.get(&id))
            .is_some_and(|target| target.is_alive() && self.target_in_attack_range(target.center()))
    }

    fn update_attacking(&mut self, sim: &mut Sim) {
        let target = self
            .nearest_enemy
            .and_then(|id| sim.units.get(&id))
            .filter(|target| target.is_alive())
            .map(|target| (target.id, target.center()));
        let Some((target_id, target_center)) = target else {
            self.nearest_enemy = None;
            self.change_state(UnitState::Idle);
            return;
        };

        let desired = facing_angle(target_center - self.center());
        self.moving_angle = rotate_toward(self.moving_angle, desired, ATTACK_TURN_RATE);

        if self.target_in_attack_range(target_center) {
            self.stats.attack_frames_cur += 1;
            if self.stats.attack_frames_cur >= self.stats.attack_frames {
                self.stats.attack_frames_cur = 0;
                sim.apply_damage(self.id, target_id, self.stats.damage);
            }
            return;
        }

        self.stats.attack_frames_cur = 0;
        if self.edge_distance_to(target_center) <= self.aggro_range(sim.config.tile_size) {
            self.destinations.clear();
            self.destinations.push_back(target_center);
            self.change_state(UnitState::moving_then(UnitState::Attacking));
        } else {
            self.nearest_enemy = None;
            self.change_state(UnitState::Idle);
        }
    }

    fn update_harvesting(&mut self, sim: &mut Sim, timer: u32) {
        let Some(resource_pos) = self.last_resource_pos else {
            self.change_state(UnitState::Idle);
            return;
        };
        if self.edge_distance_to(resource_pos) > sim.config.harvest_distance {
            self.destinations.clear();
            self.destinations.push_back(resource_pos);
            self.change_state(UnitState::moving_then(UnitState::Harvesting { timer: 0 }));
            return;
        }

        let timer = timer + 1;
        let faster = sim.faction_has_tech(self.faction, &TechId::FASTER_GATHERING);
        if timer < sim.config.harvest_ticks(faster) {
            self.state = UnitState::Harvesting { timer };
            return;
        }

        self.stats.resource_type_carried = sim.tilemap.tile_at(resource_pos).and_then(TileKind::resource);
        self.stats.resources_carried = sim.config.harvest_amount;

        let Some((home, home_center)) = sim.nearest_home(self) else {
            tracing::debug!(unit = self.id, "no hive to deliver to");
            self.change_state(UnitState::Idle);
            return;
        };
        self.nearest_home = Some(home);
        match sim.approach_point(self, home_center) {
            Some(waypoint) => self.destinations.push_back(waypoint),
            None => self.destinations.push_back(home_center),
        }
        self.change_state(UnitState::Delivering);
    }

    fn update_delivering(&mut self, sim: &mut Sim) {
        let home = self
            .nearest_home
            .and_then(|id| sim.buildings.get(&id))
            .map(|b| (b.id, b.center()))
            .or_else(|| sim.nearest_home(self));
        let Some((home, home_center)) = home else {
            self.nearest_home = None;
            self.change_state(UnitState::Idle);
            return;
        };
        self.nearest_home = Some(home);

        self.move_to_destination(sim);

        if self.edge_distance_to(home_center) <= sim.config.deliver_range {
            if let Some(kind) = self.stats.resource_type_carried.take() {
                sim.deposit(self.faction, kind, self.stats.resources_carried);
            }
            self.stats.resources_carried = 0;
            self.change_state(UnitState::Harvesting { timer: 0 });
            if let Some(resource_pos) = self.last_resource_pos {
                self.destinations.push_back(resource_pos);
            }
            return;
        }

        if !self.destinations.is_empty() {
            return;
        }
        match sim.approach_point(self, home_center) {
            Some(waypoint) if self.edge_distance_to(waypoint) > sim.config.arrival_threshold => {
                self.destinations.push_back(waypoint);
                self.change_state(UnitState::moving_then(UnitState::Delivering));
            }
            // Already beside the hive: walk straight at it.
            _ => self.destinations.push_back(home_center),
        }
    }
}
