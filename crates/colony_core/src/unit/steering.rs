//! Local steering: goal seeking, neighbour repulsion, collision and
//! stuck recovery.
//!
//! There is no global path planner. A unit heads straight for its front
//! waypoint, is pushed aside by nearby units, slides along whichever axis
//! is free, and after standing still long enough backs off one tile.

use std::f64::consts::FRAC_PI_2;

use super::{Unit, UnitState};
use crate::math::{facing_angle, rotate_toward, Rect, Vec2};
use crate::simulation::Sim;

/// Max turn per tick while walking, in radians.
const MOVE_TURN_RATE: f64 = 1.0;

/// Head-on pushes are this mostly vertical before a sideways deflection is added.
const HEAD_ON_MAX_X: f64 = 0.2;
const HEAD_ON_MIN_Y: f64 = 0.5;
const DEFLECTION_STRENGTH: f64 = 1.5;

impl Unit {
    /// Take one step toward the front waypoint.
    ///
    /// Pops the waypoint once the box is within the arrival threshold of it.
    /// Does nothing when there are no waypoints.
    pub(crate) fn move_to_destination(&mut self, sim: &Sim) {
        let Some(&dest) = self.destinations.front() else {
            return;
        };
        let config = &sim.config;
        let speed = self.stats.move_speed;
        let old_center = self.center();

        let to_target = (dest - old_center).normalize();
        let repulsion = self.compute_repulsion(sim);
        let move_vec = (to_target + repulsion * config.repulsion_weight)
            .normalize()
            .scale(speed);
        let move_x = move_vec.x.abs().min(speed).copysign(move_vec.x);
        let move_y = move_vec.y.abs().min(speed).copysign(move_vec.y);

        if move_x != 0.0 {
            let candidate = self
                .rect
                .moved_to(Vec2::new(self.position.x + move_x, self.position.y));
            if !self.is_colliding(&candidate, sim) {
                self.set_position(candidate.min);
            }
        }
        if move_y != 0.0 {
            let candidate = self
                .rect
                .moved_to(Vec2::new(self.position.x, self.position.y + move_y));
            if !self.is_colliding(&candidate, sim) {
                self.set_position(candidate.min);
            }
        }

        let delta = self.center() - old_center;
        if delta != Vec2::ZERO {
            self.stuck_frames = 0;
            self.moving_angle = rotate_toward(self.moving_angle, facing_angle(delta), MOVE_TURN_RATE);
        }

        let arrived = self.edge_distance_to(dest) <= config.arrival_threshold;
        let moved = delta.x.abs() > config.stuck_epsilon || delta.y.abs() > config.stuck_epsilon;
        if !moved && !arrived {
            self.stuck_frames += 1;
            if config.stuck_nudge_interval > 0 && self.stuck_frames % config.stuck_nudge_interval == 0 {
                self.navigate_around(sim);
            }
        }
        if arrived {
            self.destinations.pop_front();
        }
    }

    /// Whether the unit, moved to `candidate`, would hit something.
    ///
    /// The unit is a circle inscribed in `candidate`. Units and solid
    /// buildings whose boxes overlap the candidate are tested as circles;
    /// static obstacles with a closest-point test. Two workers of one faction
    /// never block each other while the mover is busy.
    pub(crate) fn is_colliding(&self, candidate: &Rect, sim: &Sim) -> bool {
        let center = candidate.center();
        let radius = candidate.width() / 2.0;
        let ignore_workers = self.is_worker() && self.state != UnitState::Idle;

        let hits_unit = sim
            .units
            .values()
            .filter(|other| other.id != self.id && other.rect.overlaps(candidate))
            .filter(|other| !(ignore_workers && other.is_worker() && other.faction == self.faction))
            .any(|other| center.distance(other.center()) < radius + other.rect.width() / 2.0);
        if hits_unit {
            return true;
        }

        let hits_building = sim
            .buildings
            .values()
            .filter(|b| b.collision && b.rect.overlaps(candidate))
            .any(|b| center.distance(b.center()) < radius + b.rect.width() / 2.0);
        if hits_building {
            return true;
        }

        sim.tilemap
            .obstacles()
            .iter()
            .any(|obstacle| obstacle.intersects_circle(center, radius))
    }

    /// Sum of pushes away from every unit within the repulsion radius.
    ///
    /// Nearly head-on pushes get a sideways kick so two units walking into
    /// each other slip past. The side is picked from id order.
    pub(crate) fn compute_repulsion(&self, sim: &Sim) -> Vec2 {
        let radius = sim.config.repulsion_radius;
        let my_center = self.center();
        let mut repulsion = Vec2::ZERO;

        for other in sim.units.values().filter(|o| o.id != self.id) {
            let dir = my_center - other.center();
            let dist = dir.length();
            if dist >= radius || dist <= 0.1 {
                continue;
            }
            let mut push = dir.normalize().scale((radius - dist) / radius);
            if push.x.abs() < HEAD_ON_MAX_X && push.y.abs() > HEAD_ON_MIN_Y {
                let side = if self.id < other.id { 1.0 } else { -1.0 };
                push += Vec2::new(side * DEFLECTION_STRENGTH, 0.0);
            }
            repulsion += push;
        }
        repulsion
    }

    /// Push a waypoint one tile behind the unit, opposite its facing.
    ///
    /// The waypoint is clamped so the unit's box stays on the map.
    pub(crate) fn navigate_around(&mut self, sim: &Sim) {
        let heading = self.moving_angle - FRAC_PI_2;
        let backwards = Vec2::new(-heading.cos(), -heading.sin()).normalize();
        let mut back = self.center() + backwards.scale(sim.config.tile_size);

        let max_x = (sim.tilemap.pixel_width() - self.rect.width()).max(0.0);
        let max_y = (sim.tilemap.pixel_height() - self.rect.height()).max(0.0);
        back.x = back.x.clamp(0.0, max_x);
        back.y = back.y.clamp(0.0, max_y);

        tracing::trace!(unit = self.id, x = back.x, y = back.y, "stuck, backing off");
        self.destinations.push_front(back);
    }
}
